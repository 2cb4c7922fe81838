//! Gating predicates evaluated before an operation executes.

use super::OpId;

/// Terminal status of a dependency, as visible to conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DepStatus {
    /// The dependency finished successfully.
    Succeeded,
    /// The dependency was skipped by one of its own conditions; treated as
    /// vacuously succeeded.
    Skipped,
    /// The dependency failed, or was gated by one of its own conditions.
    Failed,
    /// The dependency was cancelled.
    Cancelled,
}

/// Snapshot of one dependency's terminal state.
#[derive(Debug, Clone)]
pub struct DepSnapshot {
    /// The dependency's ID.
    pub id: OpId,
    /// The dependency's label.
    pub label: &'static str,
    /// The dependency's terminal status.
    pub status: DepStatus,
}

/// Outcome of evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    /// Apply injectors and execute the work body.
    Proceed,
    /// Do not execute; record the operation as vacuously succeeded.
    Skip,
    /// Do not execute; record the operation as finished with a gating
    /// error. Dependents observe this as a failure.
    Fail {
        /// Human-readable gating reason, used for diagnostics.
        reason: String,
    },
}

/// A predicate over dependency state, evaluated at the moment an operation
/// becomes a scheduling candidate (all dependencies terminal).
pub enum Condition {
    /// Fail the operation if any dependency failed. When `ignore_cancelled`
    /// is false, cancelled dependencies count as failures too.
    NoFailedDependencies {
        /// Whether cancelled dependencies are tolerated.
        ignore_cancelled: bool,
    },
    /// Custom predicate over the dependency snapshots.
    Custom(Box<dyn Fn(&[DepSnapshot]) -> ConditionOutcome + Send>),
}

impl Condition {
    /// Condition that fails the operation when any dependency failed,
    /// optionally tolerating cancelled dependencies.
    pub fn no_failed_dependencies(ignore_cancelled: bool) -> Self {
        Self::NoFailedDependencies { ignore_cancelled }
    }

    /// Custom condition from a predicate over dependency snapshots.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&[DepSnapshot]) -> ConditionOutcome + Send + 'static,
    {
        Self::Custom(Box::new(predicate))
    }

    /// Evaluates the condition against the operation's dependencies.
    pub(crate) fn evaluate(&self, deps: &[DepSnapshot]) -> ConditionOutcome {
        match self {
            Self::NoFailedDependencies { ignore_cancelled } => {
                for dep in deps {
                    let blocking = match dep.status {
                        DepStatus::Failed => true,
                        DepStatus::Cancelled => !ignore_cancelled,
                        DepStatus::Succeeded | DepStatus::Skipped => false,
                    };
                    if blocking {
                        return ConditionOutcome::Fail {
                            reason: format!("dependency `{}` {}", dep.label, dep.status),
                        };
                    }
                }
                ConditionOutcome::Proceed
            }
            Self::Custom(predicate) => predicate(deps),
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFailedDependencies { ignore_cancelled } => f
                .debug_struct("NoFailedDependencies")
                .field("ignore_cancelled", ignore_cancelled)
                .finish(),
            Self::Custom(_) => f.debug_tuple("Custom").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(label: &'static str, status: DepStatus) -> DepSnapshot {
        DepSnapshot {
            id: OpId::new(),
            label,
            status,
        }
    }

    #[test]
    fn test_no_failed_dependencies_proceeds_on_success_and_skip() {
        let condition = Condition::no_failed_dependencies(false);
        let deps = [
            snapshot("a", DepStatus::Succeeded),
            snapshot("b", DepStatus::Skipped),
        ];

        assert_eq!(condition.evaluate(&deps), ConditionOutcome::Proceed);
    }

    #[test]
    fn test_no_failed_dependencies_fails_on_failed_dependency() {
        let condition = Condition::no_failed_dependencies(false);
        let deps = [snapshot("fetch-account", DepStatus::Failed)];

        let outcome = condition.evaluate(&deps);
        assert!(
            matches!(outcome, ConditionOutcome::Fail { reason } if reason.contains("fetch-account"))
        );
    }

    #[test]
    fn test_cancelled_dependency_counts_as_failure_unless_ignored() {
        let deps = [snapshot("a", DepStatus::Cancelled)];

        let strict = Condition::no_failed_dependencies(false);
        assert!(matches!(
            strict.evaluate(&deps),
            ConditionOutcome::Fail { .. }
        ));

        let lenient = Condition::no_failed_dependencies(true);
        assert_eq!(lenient.evaluate(&deps), ConditionOutcome::Proceed);
    }

    #[test]
    fn test_custom_condition() {
        let condition = Condition::custom(|deps| {
            if deps.is_empty() {
                ConditionOutcome::Skip
            } else {
                ConditionOutcome::Proceed
            }
        });

        assert_eq!(condition.evaluate(&[]), ConditionOutcome::Skip);
    }
}
