//! Operation primitives.
//!
//! This module provides the building blocks a graph is assembled from:
//! - [`OpId`]: Unique identifier for operations
//! - [`Operation`]: A single unit of cancellable asynchronous work
//! - [`Condition`]: Gating predicate evaluated before an operation runs
//! - [`Injector`]: Deferred output-to-input copy between operations
//! - [`InputContext`]: Write-once input slots owned by a consuming operation

mod condition;
mod context;
mod id;
mod injector;

pub use condition::{Condition, ConditionOutcome, DepSnapshot, DepStatus};
pub use context::InputContext;
pub use id::OpId;
pub use injector::Injector;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Lifecycle state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum OpState {
    /// Not yet started; dependencies may still be running.
    Pending,
    /// Work body is in flight.
    Executing,
    /// Reached a terminal result: succeeded, skipped, gated or failed.
    Finished,
    /// Cancelled before start, or the work acknowledged cancellation.
    Cancelled,
}

/// Failure modes surfaced by an operation's work body.
#[derive(Debug)]
pub enum WorkError<E> {
    /// The work observed its cancellation token and aborted cooperatively.
    Cancelled,
    /// The work failed with a collaborator error.
    Failed(E),
}

impl<E> From<E> for WorkError<E> {
    fn from(error: E) -> Self {
        Self::Failed(error)
    }
}

/// Result of a single work body: an optional output value on success.
pub type WorkOutput<V, E> = Result<Option<V>, WorkError<E>>;

/// Boxed future produced by a work body.
pub type WorkFuture<V, E> = BoxFuture<'static, WorkOutput<V, E>>;

/// Boxed work body. Invoked at most once, after all dependencies reached a
/// terminal state, conditions passed and injectors were applied.
pub type WorkFn<V, E> = Box<dyn FnOnce(InputContext<V>, CancellationToken) -> WorkFuture<V, E> + Send>;

/// A single schedulable unit of cancellable asynchronous work.
///
/// Side effects happen strictly inside the work body, never during graph
/// construction. Capabilities (input slots, output value, blocking policy,
/// terminal marker) are configured on the one `Operation` type rather than
/// through a type hierarchy.
pub struct Operation<V, E> {
    label: &'static str,
    work: WorkFn<V, E>,
    conditions: Vec<Condition>,
    injectors: Vec<Injector<V>>,
    non_blocking: bool,
    terminal: bool,
}

impl<V, E> Operation<V, E> {
    /// Creates an operation from a label and a work body.
    ///
    /// The work body receives the operation's [`InputContext`] (populated
    /// by injectors) and a transition-scoped child [`CancellationToken`]
    /// it may race its own I/O against.
    pub fn new<W, Fut>(label: &'static str, work: W) -> Self
    where
        W: FnOnce(InputContext<V>, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = WorkOutput<V, E>> + Send + 'static,
    {
        Self {
            label,
            work: Box::new(move |ctx, token| {
                let future: WorkFuture<V, E> = Box::pin(work(ctx, token));
                future
            }),
            conditions: Vec::new(),
            injectors: Vec::new(),
            non_blocking: false,
            terminal: false,
        }
    }

    /// Adds a gating condition, evaluated in declaration order.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Marks the operation's failure as non-blocking: logged, but excluded
    /// from the transition's failure determination.
    pub fn non_blocking(mut self) -> Self {
        self.non_blocking = true;
        self
    }

    /// Marks the operation as the designated result producer of its graph.
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Returns the operation's label.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns whether failures of this operation are non-blocking.
    pub fn is_non_blocking(&self) -> bool {
        self.non_blocking
    }

    /// Returns whether this operation is the designated result producer.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Returns the gating conditions in declaration order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub(crate) fn push_injector(&mut self, injector: Injector<V>) {
        self.injectors.push(injector);
    }

    pub(crate) fn into_execution_parts(self) -> (Vec<Injector<V>>, WorkFn<V, E>) {
        (self.injectors, self.work)
    }
}

impl<V, E> std::fmt::Debug for Operation<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("label", &self.label)
            .field("conditions", &self.conditions.len())
            .field("injectors", &self.injectors.len())
            .field("non_blocking", &self.non_blocking)
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_state_display() {
        assert_eq!(OpState::Pending.to_string(), "pending");
        assert_eq!(OpState::Executing.to_string(), "executing");
        assert_eq!(OpState::Finished.to_string(), "finished");
        assert_eq!(OpState::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_operation_configuration() {
        let op: Operation<(), String> = Operation::new("noop", |_ctx, _token| async { Ok(None) })
            .with_condition(Condition::no_failed_dependencies(false))
            .non_blocking()
            .terminal();

        assert_eq!(op.label(), "noop");
        assert_eq!(op.conditions().len(), 1);
        assert!(op.is_non_blocking());
        assert!(op.is_terminal());
    }

    #[test]
    fn test_work_error_from_collaborator_error() {
        let error: WorkError<String> = String::from("boom").into();
        assert!(matches!(error, WorkError::Failed(message) if message == "boom"));
    }
}
