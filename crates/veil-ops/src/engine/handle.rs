//! Caller-facing handle for a running transition.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::TerminalOutcome;
use crate::TRACING_TARGET;
use crate::error::OpsError;

/// Handle to a spawned transition.
///
/// Returned synchronously by
/// [`OperationQueue::spawn`](super::OperationQueue::spawn); the terminal
/// outcome is delivered asynchronously, exactly once, through [`wait`].
///
/// [`wait`]: TransitionHandle::wait
#[derive(Debug)]
pub struct TransitionHandle<V, E> {
    token: CancellationToken,
    outcome: oneshot::Receiver<TerminalOutcome<V, E>>,
}

impl<V, E> TransitionHandle<V, E> {
    pub(crate) fn new(
        token: CancellationToken,
        outcome: oneshot::Receiver<TerminalOutcome<V, E>>,
    ) -> Self {
        Self { token, outcome }
    }

    /// Requests cancellation of the whole transition. Idempotent.
    ///
    /// Not-yet-started operations are cancelled immediately; executing
    /// operations are asked to abort cooperatively; finished operations
    /// keep their results.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(target: TRACING_TARGET, "transition cancellation requested");
        }
        self.token.cancel();
    }

    /// Returns the transition-scoped cancellation token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Waits for the transition's terminal outcome.
    pub async fn wait(self) -> TerminalOutcome<V, E>
    where
        E: From<OpsError>,
    {
        self.outcome.await.unwrap_or_else(|_| {
            TerminalOutcome::Failure(E::from(OpsError::Internal(
                "queue dropped before delivering an outcome".into(),
            )))
        })
    }
}
