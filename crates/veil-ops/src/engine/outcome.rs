//! Per-operation records and transition result aggregation.

use crate::node::{OpId, OpState};

/// Terminal outcome of a single operation.
#[derive(Debug)]
pub enum OpOutcome<V, E> {
    /// The work body finished successfully, possibly with an output.
    Succeeded(Option<V>),
    /// A condition skipped the operation; treated as vacuously succeeded.
    Skipped,
    /// A condition failed the operation before its work ran.
    Gated {
        /// The condition's gating reason.
        reason: String,
    },
    /// The work body failed with a collaborator error.
    Failed(E),
    /// The operation was cancelled before start, or its work acknowledged
    /// cancellation.
    Cancelled,
}

impl<V, E> OpOutcome<V, E> {
    /// Returns whether the operation reached a successful terminal state.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Skipped)
    }
}

/// One operation's record in a [`TransitionReport`].
#[derive(Debug)]
pub struct OpRecord<V, E> {
    /// The operation's ID.
    pub id: OpId,
    /// The operation's label.
    pub label: &'static str,
    /// Whether failures of this operation block the transition.
    pub non_blocking: bool,
    /// Whether this operation is the designated result producer.
    pub terminal: bool,
    /// The operation's terminal outcome.
    pub outcome: OpOutcome<V, E>,
}

impl<V, E> OpRecord<V, E> {
    /// Lifecycle state the operation ended in.
    pub fn state(&self) -> OpState {
        match self.outcome {
            OpOutcome::Cancelled => OpState::Cancelled,
            _ => OpState::Finished,
        }
    }
}

/// Execution report for one transition, with records in dependency order
/// (ties broken by declaration order).
#[derive(Debug)]
pub struct TransitionReport<V, E> {
    records: Vec<OpRecord<V, E>>,
}

impl<V, E> TransitionReport<V, E> {
    pub(crate) fn new(records: Vec<OpRecord<V, E>>) -> Self {
        Self { records }
    }

    /// Returns the per-operation records in dependency order.
    pub fn records(&self) -> &[OpRecord<V, E>] {
        &self.records
    }

    /// Reduces the report to the transition's single terminal outcome.
    ///
    /// In order:
    /// 1. a successful designated terminal operation commits the
    ///    transition, even against a late cancellation;
    /// 2. any cancelled operation resolves the transition cancelled;
    /// 3. the first blocking failure in dependency order becomes the
    ///    transition failure — non-blocking failures were logged when
    ///    recorded and are excluded here, and gated operations carry no
    ///    error of their own (their upstream cause sorts earlier);
    /// 4. otherwise the transition succeeded without a value.
    pub fn into_outcome(self) -> TerminalOutcome<V, E> {
        let mut cancelled = false;
        let mut first_failure: Option<E> = None;
        let mut terminal_value: Option<Option<V>> = None;

        for record in self.records {
            match record.outcome {
                OpOutcome::Succeeded(value) => {
                    if record.terminal {
                        terminal_value = Some(value);
                    }
                }
                OpOutcome::Cancelled => cancelled = true,
                OpOutcome::Failed(error) => {
                    if !record.non_blocking && first_failure.is_none() {
                        first_failure = Some(error);
                    }
                }
                OpOutcome::Skipped | OpOutcome::Gated { .. } => {}
            }
        }

        if let Some(value) = terminal_value {
            return TerminalOutcome::Success(value);
        }
        if cancelled {
            return TerminalOutcome::Cancelled;
        }
        if let Some(error) = first_failure {
            return TerminalOutcome::Failure(error);
        }
        TerminalOutcome::Success(None)
    }
}

/// The single outcome delivered for a whole transition.
#[derive(Debug)]
pub enum TerminalOutcome<V, E> {
    /// The transition completed; the value is the designated terminal
    /// operation's output, or `None` for value-less transitions.
    Success(Option<V>),
    /// The transition failed with the first blocking error.
    Failure(E),
    /// The transition was cancelled before its terminal operation
    /// committed a result.
    Cancelled,
}

impl<V, E> TerminalOutcome<V, E> {
    /// Returns whether the transition succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns whether the transition was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Maps the success value.
    pub fn map<U, F>(self, f: F) -> TerminalOutcome<U, E>
    where
        F: FnOnce(V) -> U,
    {
        match self {
            Self::Success(value) => TerminalOutcome::Success(value.map(f)),
            Self::Failure(error) => TerminalOutcome::Failure(error),
            Self::Cancelled => TerminalOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        label: &'static str,
        non_blocking: bool,
        terminal: bool,
        outcome: OpOutcome<u32, String>,
    ) -> OpRecord<u32, String> {
        OpRecord {
            id: OpId::new(),
            label,
            non_blocking,
            terminal,
            outcome,
        }
    }

    #[test]
    fn test_record_state() {
        let finished = record("a", false, false, OpOutcome::Succeeded(None));
        assert_eq!(finished.state(), OpState::Finished);

        let cancelled = record("b", false, false, OpOutcome::Cancelled);
        assert_eq!(cancelled.state(), OpState::Cancelled);
    }

    #[test]
    fn test_terminal_success_wins() {
        let report = TransitionReport::new(vec![
            record("unset", false, false, OpOutcome::Succeeded(None)),
            record("save", false, true, OpOutcome::Succeeded(Some(7))),
        ]);

        assert!(matches!(
            report.into_outcome(),
            TerminalOutcome::Success(Some(7))
        ));
    }

    #[test]
    fn test_terminal_commit_beats_late_cancellation() {
        let report = TransitionReport::new(vec![
            record("cleanup", false, false, OpOutcome::Cancelled),
            record("save", false, true, OpOutcome::Succeeded(Some(7))),
        ]);

        assert!(matches!(
            report.into_outcome(),
            TerminalOutcome::Success(Some(7))
        ));
    }

    #[test]
    fn test_cancellation_beats_failure() {
        let report = TransitionReport::new(vec![
            record("fetch", false, false, OpOutcome::Failed("boom".into())),
            record("save", false, true, OpOutcome::Cancelled),
        ]);

        assert!(report.into_outcome().is_cancelled());
    }

    #[test]
    fn test_first_blocking_failure_in_dependency_order() {
        let report = TransitionReport::new(vec![
            record("fetch", false, false, OpOutcome::Failed("first".into())),
            record("create", false, false, OpOutcome::Failed("second".into())),
        ]);

        assert!(matches!(
            report.into_outcome(),
            TerminalOutcome::Failure(error) if error == "first"
        ));
    }

    #[test]
    fn test_non_blocking_failure_excluded() {
        let report = TransitionReport::new(vec![
            record("delete", true, false, OpOutcome::Failed("ignored".into())),
            record("unset", false, false, OpOutcome::Succeeded(None)),
        ]);

        assert!(matches!(
            report.into_outcome(),
            TerminalOutcome::Success(None)
        ));
    }

    #[test]
    fn test_gated_operations_carry_no_error() {
        let report = TransitionReport::new(vec![
            record("fetch", false, false, OpOutcome::Failed("cause".into())),
            record(
                "create",
                false,
                false,
                OpOutcome::Gated {
                    reason: "dependency `fetch` failed".into(),
                },
            ),
        ]);

        assert!(matches!(
            report.into_outcome(),
            TerminalOutcome::Failure(error) if error == "cause"
        ));
    }
}
