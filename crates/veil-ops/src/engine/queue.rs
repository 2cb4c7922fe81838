//! The operation queue: scheduling, cancellation and completion.

use std::collections::HashMap;
use std::fmt::Display;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::config::QueueConfig;
use super::handle::TransitionHandle;
use super::outcome::{OpOutcome, OpRecord, TransitionReport};
use crate::TRACING_TARGET;
use crate::error::{OpsError, OpsResult};
use crate::graph::OperationGraph;
use crate::node::{
    ConditionOutcome, DepSnapshot, DepStatus, InputContext, OpId, Operation, WorkError, WorkOutput,
};

/// Static facts about an operation, kept after its work has been consumed.
#[derive(Debug, Clone, Copy)]
struct OpMeta {
    label: &'static str,
    non_blocking: bool,
    terminal: bool,
}

/// Scheduler for one transition's operation graph.
///
/// Owns the graph exclusively from construction until the terminal
/// outcome is delivered. Repeatedly selects ready operations (all
/// dependencies terminal, not cancelled), evaluates their conditions,
/// applies their injectors and executes their work bodies, respecting the
/// configured concurrency bound. The completion is delivered exactly once,
/// after every operation has a terminal record.
pub struct OperationQueue<V, E> {
    ops: HashMap<OpId, Operation<V, E>>,
    metas: HashMap<OpId, OpMeta>,
    order: Vec<OpId>,
    deps: HashMap<OpId, Vec<OpId>>,
    config: QueueConfig,
    token: CancellationToken,
}

impl<V, E> OperationQueue<V, E>
where
    V: Send + 'static,
    E: From<OpsError> + Display + Send + 'static,
{
    /// Creates a queue over a validated graph with the default config.
    pub fn new(graph: OperationGraph<V, E>) -> OpsResult<Self> {
        Self::with_config(graph, QueueConfig::default())
    }

    /// Creates a queue over a validated graph.
    ///
    /// Validation happens here, at build time: a cyclic or otherwise
    /// malformed graph is rejected before anything executes.
    pub fn with_config(graph: OperationGraph<V, E>, config: QueueConfig) -> OpsResult<Self> {
        graph.validate()?;
        let order = graph.dependency_order()?;

        let position: HashMap<OpId, usize> = order
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        let deps: HashMap<OpId, Vec<OpId>> = order
            .iter()
            .map(|id| {
                let mut dependencies = graph.dependencies_of(*id);
                dependencies.sort_by_key(|dep| position.get(dep).copied());
                dependencies.dedup();
                (*id, dependencies)
            })
            .collect();
        let metas: HashMap<OpId, OpMeta> = order
            .iter()
            .filter_map(|id| {
                let op = graph.get(*id)?;
                Some((
                    *id,
                    OpMeta {
                        label: op.label(),
                        non_blocking: op.is_non_blocking(),
                        terminal: op.is_terminal(),
                    },
                ))
            })
            .collect();

        Ok(Self {
            ops: graph.into_operations(),
            metas,
            order,
            deps,
            config,
            token: CancellationToken::new(),
        })
    }

    /// Returns the transition-scoped cancellation token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Spawns the queue onto the runtime and returns the caller handle.
    pub fn spawn(self) -> TransitionHandle<V, E> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let token = self.token.clone();

        tokio::spawn(async move {
            let report = self.run().await;
            let _ = outcome_tx.send(report.into_outcome());
        });

        TransitionHandle::new(token, outcome_rx)
    }

    /// Drives the graph to completion and returns the full report.
    pub async fn run(self) -> TransitionReport<V, E> {
        let Self {
            mut ops,
            metas,
            order,
            deps,
            config,
            token,
        } = self;

        let mut done: HashMap<OpId, OpOutcome<V, E>> = HashMap::new();
        let mut join_set: JoinSet<(OpId, WorkOutput<V, E>)> = JoinSet::new();
        let mut task_ids: HashMap<tokio::task::Id, OpId> = HashMap::new();

        tracing::debug!(
            target: TRACING_TARGET,
            operations = order.len(),
            "transition started"
        );

        loop {
            // Transition-level cancellation: operations that never started
            // are cancelled outright; executing ones keep running until
            // their work acknowledges the child token.
            if token.is_cancelled() && !ops.is_empty() {
                for (id, op) in ops.drain() {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        op = %id,
                        label = op.label(),
                        "operation cancelled before start"
                    );
                    done.insert(id, OpOutcome::Cancelled);
                }
            }

            // Schedule until fixpoint: gating or skipping an operation can
            // make its dependents ready within the same pass.
            let mut progressed = true;
            while progressed {
                progressed = false;

                let ready: Vec<OpId> = order
                    .iter()
                    .copied()
                    .filter(|id| ops.contains_key(id))
                    .filter(|id| {
                        deps.get(id)
                            .is_none_or(|d| d.iter().all(|dep| done.contains_key(dep)))
                    })
                    .collect();

                for id in ready {
                    if config
                        .max_concurrency
                        .is_some_and(|max| join_set.len() >= max)
                    {
                        break;
                    }
                    let Some(op) = ops.remove(&id) else {
                        continue;
                    };

                    let snapshots = dep_snapshots(&id, &deps, &done, &metas);
                    let mut verdict = ConditionOutcome::Proceed;
                    for condition in op.conditions() {
                        match condition.evaluate(&snapshots) {
                            ConditionOutcome::Proceed => {}
                            other => {
                                verdict = other;
                                break;
                            }
                        }
                    }

                    match verdict {
                        ConditionOutcome::Skip => {
                            tracing::debug!(
                                target: TRACING_TARGET,
                                op = %id,
                                label = op.label(),
                                "operation skipped"
                            );
                            done.insert(id, OpOutcome::Skipped);
                            progressed = true;
                        }
                        ConditionOutcome::Fail { reason } => {
                            tracing::debug!(
                                target: TRACING_TARGET,
                                op = %id,
                                label = op.label(),
                                reason,
                                "operation gated"
                            );
                            done.insert(id, OpOutcome::Gated { reason });
                            progressed = true;
                        }
                        ConditionOutcome::Proceed => {
                            let label = op.label();
                            let (injectors, work) = op.into_execution_parts();

                            let mut ctx = InputContext::new();
                            let mut contract_error = None;
                            for injector in injectors {
                                // Injectors with an unsuccessful or
                                // valueless source contribute nothing; the
                                // operation's conditions decide whether
                                // that was acceptable.
                                let source = injector.source();
                                if let Some(OpOutcome::Succeeded(Some(output))) = done.get(&source)
                                {
                                    if let Err(error) = injector.apply(output, &mut ctx) {
                                        contract_error = Some(error);
                                        break;
                                    }
                                }
                            }
                            if let Some(error) = contract_error {
                                tracing::error!(
                                    target: TRACING_TARGET,
                                    op = %id,
                                    label,
                                    error = %error,
                                    "injector contract violation"
                                );
                                done.insert(id, OpOutcome::Failed(E::from(error)));
                                progressed = true;
                                continue;
                            }

                            tracing::debug!(
                                target: TRACING_TARGET,
                                op = %id,
                                label,
                                "operation started"
                            );
                            let child = token.child_token();
                            let handle =
                                join_set.spawn(async move { (id, work(ctx, child).await) });
                            task_ids.insert(handle.id(), id);
                        }
                    }
                }
            }

            if done.len() == metas.len() {
                break;
            }

            if join_set.is_empty() {
                if token.is_cancelled() {
                    continue;
                }
                // A validated acyclic graph always has a runnable
                // candidate when nothing is executing; reaching this
                // branch means the dependency bookkeeping is broken.
                for (id, op) in ops.drain() {
                    tracing::error!(
                        target: TRACING_TARGET,
                        op = %id,
                        label = op.label(),
                        "operation never became ready"
                    );
                    done.insert(
                        id,
                        OpOutcome::Failed(E::from(OpsError::Internal(format!(
                            "operation `{}` never became ready",
                            op.label()
                        )))),
                    );
                }
                continue;
            }

            tokio::select! {
                _ = token.cancelled(), if !token.is_cancelled() => {}
                joined = join_set.join_next_with_id() => {
                    match joined {
                        Some(Ok((task_id, (id, output)))) => {
                            task_ids.remove(&task_id);
                            record(&mut done, &metas, &token, id, output);
                        }
                        Some(Err(join_error)) => {
                            if let Some(id) = task_ids.remove(&join_error.id()) {
                                tracing::error!(
                                    target: TRACING_TARGET,
                                    op = %id,
                                    "operation work panicked"
                                );
                                done.insert(
                                    id,
                                    OpOutcome::Failed(E::from(OpsError::Internal(
                                        "operation work panicked".into(),
                                    ))),
                                );
                            }
                        }
                        None => {}
                    }
                }
            }
        }

        tracing::debug!(target: TRACING_TARGET, "transition completed");

        let mut records = Vec::with_capacity(order.len());
        for id in &order {
            let Some(outcome) = done.remove(id) else {
                continue;
            };
            let Some(meta) = metas.get(id) else {
                continue;
            };
            records.push(OpRecord {
                id: *id,
                label: meta.label,
                non_blocking: meta.non_blocking,
                terminal: meta.terminal,
                outcome,
            });
        }
        TransitionReport::new(records)
    }
}

impl<V, E> std::fmt::Debug for OperationQueue<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationQueue")
            .field("operations", &self.order.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Builds the dependency snapshots an operation's conditions evaluate.
fn dep_snapshots<V, E>(
    id: &OpId,
    deps: &HashMap<OpId, Vec<OpId>>,
    done: &HashMap<OpId, OpOutcome<V, E>>,
    metas: &HashMap<OpId, OpMeta>,
) -> Vec<DepSnapshot> {
    let Some(dependencies) = deps.get(id) else {
        return Vec::new();
    };
    dependencies
        .iter()
        .filter_map(|dep| {
            let status = match done.get(dep)? {
                OpOutcome::Succeeded(_) => DepStatus::Succeeded,
                OpOutcome::Skipped => DepStatus::Skipped,
                OpOutcome::Gated { .. } | OpOutcome::Failed(_) => DepStatus::Failed,
                OpOutcome::Cancelled => DepStatus::Cancelled,
            };
            let label = metas.get(dep).map(|meta| meta.label)?;
            Some(DepSnapshot {
                id: *dep,
                label,
                status,
            })
        })
        .collect()
}

/// Commits one work result into the done set.
///
/// A success always commits, even after cancellation; an uncommitted
/// failure arriving after the token fired is recorded as cancelled.
fn record<V, E>(
    done: &mut HashMap<OpId, OpOutcome<V, E>>,
    metas: &HashMap<OpId, OpMeta>,
    token: &CancellationToken,
    id: OpId,
    output: WorkOutput<V, E>,
) where
    E: Display,
{
    let meta = metas.get(&id);
    let label = meta.map(|m| m.label).unwrap_or("unknown");
    let non_blocking = meta.is_some_and(|m| m.non_blocking);

    let outcome = match output {
        Ok(value) => {
            tracing::debug!(target: TRACING_TARGET, op = %id, label, "operation finished");
            OpOutcome::Succeeded(value)
        }
        Err(WorkError::Cancelled) => {
            tracing::debug!(
                target: TRACING_TARGET,
                op = %id,
                label,
                "operation acknowledged cancellation"
            );
            OpOutcome::Cancelled
        }
        Err(WorkError::Failed(_)) if token.is_cancelled() => {
            tracing::debug!(
                target: TRACING_TARGET,
                op = %id,
                label,
                "late failure recorded as cancellation"
            );
            OpOutcome::Cancelled
        }
        Err(WorkError::Failed(error)) => {
            if non_blocking {
                tracing::warn!(
                    target: TRACING_TARGET,
                    op = %id,
                    label,
                    error = %error,
                    "non-blocking operation failed"
                );
            } else {
                tracing::warn!(
                    target: TRACING_TARGET,
                    op = %id,
                    label,
                    error = %error,
                    "operation failed"
                );
            }
            OpOutcome::Failed(error)
        }
    };

    done.insert(id, outcome);
}
