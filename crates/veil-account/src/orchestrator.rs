//! The account transition orchestrator.
//!
//! Maps a requested [`AccountTransition`] onto a single-use operation
//! graph and runs it. This module only wires collaborators together; it
//! contains no networking or storage logic of its own.
//!
//! The graph for `new`/`existing`:
//!
//! ```text
//! delete-device ──▶ unset-device-state ──▶ account ──▶ create-device ──▶ save-settings
//!  (if logged in)                                 └────────────────────────────▲
//! ```
//!
//! For `unset` the graph ends after `unset-device-state` and the
//! transition resolves to a value-less success.

use std::sync::Arc;

use veil_ops::engine::{OperationQueue, TerminalOutcome, TransitionHandle};
use veil_ops::graph::OperationGraph;
use veil_ops::node::{Condition, InputContext, Operation, WorkError};

use crate::TRACING_TARGET;
use crate::account::{AccountNumber, StoredAccountData};
use crate::api::{AccountsApi, DevicesApi};
use crate::device::{CreateDeviceRequest, DeviceState, KeyPair, StoredDeviceData};
use crate::error::{AccountError, AccountResult};
use crate::interactor::TunnelInteractor;
use crate::settings::TunnelSettings;
use crate::transition::{AccountTransition, TransitionValue, slots};

type AccountOp = Operation<TransitionValue, AccountError>;
type AccountGraph = OperationGraph<TransitionValue, AccountError>;

/// Terminal outcome of one account transition.
pub type TransitionOutcome = TerminalOutcome<StoredAccountData, AccountError>;

/// Handle to a running account transition.
#[derive(Debug)]
pub struct AccountTransitionHandle {
    inner: TransitionHandle<TransitionValue, AccountError>,
}

impl AccountTransitionHandle {
    /// Requests cancellation of the transition. Idempotent.
    ///
    /// A settings save that already committed wins over the cancellation;
    /// everything not yet started is cancelled outright.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Waits for the transition's terminal outcome.
    pub async fn wait(self) -> TransitionOutcome {
        match self.inner.wait().await {
            TerminalOutcome::Success(Some(value)) => match value.into_account("terminal") {
                Ok(account) => TerminalOutcome::Success(Some(account)),
                Err(error) => TerminalOutcome::Failure(error),
            },
            TerminalOutcome::Success(None) => TerminalOutcome::Success(None),
            TerminalOutcome::Failure(error) => TerminalOutcome::Failure(error),
            TerminalOutcome::Cancelled => TerminalOutcome::Cancelled,
        }
    }
}

/// Builds and runs account transition graphs against injected
/// collaborators.
pub struct AccountOrchestrator {
    interactor: Arc<dyn TunnelInteractor>,
    accounts: Arc<dyn AccountsApi>,
    devices: Arc<dyn DevicesApi>,
}

impl AccountOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        interactor: Arc<dyn TunnelInteractor>,
        accounts: Arc<dyn AccountsApi>,
        devices: Arc<dyn DevicesApi>,
    ) -> Self {
        Self {
            interactor,
            accounts,
            devices,
        }
    }

    /// Starts a transition.
    ///
    /// Returns synchronously with a handle; the terminal outcome is
    /// delivered asynchronously, exactly once, through the handle.
    pub fn run_transition(
        &self,
        transition: AccountTransition,
    ) -> AccountResult<AccountTransitionHandle> {
        tracing::debug!(
            target: TRACING_TARGET,
            task = transition.task_name(),
            "starting account transition"
        );

        let graph = self.build_graph(transition)?;
        let queue = OperationQueue::new(graph)?;
        Ok(AccountTransitionHandle {
            inner: queue.spawn(),
        })
    }

    fn build_graph(&self, transition: AccountTransition) -> AccountResult<AccountGraph> {
        let mut graph = AccountGraph::new();

        let delete_device = self.delete_device_op().map(|op| graph.insert(op));
        let unset_local = graph.insert(self.unset_device_state_op());
        if let Some(delete_device) = delete_device {
            graph.connect(delete_device, unset_local)?;
        }

        let account_op = match transition {
            AccountTransition::New => Some(self.create_account_op()),
            AccountTransition::Existing(number) => Some(self.fetch_account_op(number)),
            AccountTransition::Unset => None,
        };
        let Some(account_op) = account_op else {
            // Unset terminates after clearing local state; the aggregator
            // resolves the value-less graph to a unit success.
            return Ok(graph);
        };

        let account = graph
            .insert(account_op.with_condition(Condition::no_failed_dependencies(false)));
        graph.connect(unset_local, account)?;

        let device = graph.insert(
            self.create_device_op()
                .with_condition(Condition::no_failed_dependencies(false)),
        );
        graph.inject(account, device, |output, ctx| {
            ctx.put(slots::ACCOUNT, output.clone())
        })?;

        let save = graph.insert(
            self.save_settings_op()
                .with_condition(Condition::no_failed_dependencies(false))
                .terminal(),
        );
        graph.inject(account, save, |output, ctx| {
            ctx.put(slots::ACCOUNT, output.clone())
        })?;
        graph.inject(device, save, |output, ctx| {
            ctx.put(slots::DEVICE, output.clone())
        })?;

        Ok(graph)
    }

    /// Best-effort deletion of the currently logged-in remote device.
    /// Present only when a device is logged in; its failure never blocks
    /// the transition.
    fn delete_device_op(&self) -> Option<AccountOp> {
        let DeviceState::LoggedIn { account, device } = self.interactor.device_state() else {
            return None;
        };

        let devices = self.devices.clone();
        Some(
            Operation::new("delete-device", move |_ctx, token| async move {
                tracing::debug!(target: TRACING_TARGET, "deleting current device");

                let deleted = tokio::select! {
                    _ = token.cancelled() => return Err(WorkError::Cancelled),
                    result = devices.delete_device(&account.number, &device.identifier) => {
                        result.map_err(AccountError::from)?
                    }
                };

                if deleted {
                    tracing::debug!(target: TRACING_TARGET, "deleted device");
                } else {
                    tracing::debug!(target: TRACING_TARGET, "device is already deleted");
                }
                Ok(None)
            })
            .non_blocking(),
        )
    }

    /// Clears local device state and removes the VPN configuration.
    ///
    /// Runs unconditionally in every transition. Does not observe the
    /// cancellation token: local state writes commit once started.
    fn unset_device_state_op(&self) -> AccountOp {
        let interactor = self.interactor.clone();
        Operation::new("unset-device-state", move |_ctx, _token| async move {
            interactor.prepare_for_vpn_configuration_deletion();
            interactor.reset_tunnel_status();
            interactor.set_device_state(DeviceState::LoggedOut, true);

            if let Some(tunnel) = interactor.tunnel() {
                // Ignore errors but log them: local state is already
                // logged out at this point.
                if let Err(error) = tunnel.remove_from_preferences().await {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %error,
                        "failed to remove VPN configuration"
                    );
                }
            }

            Ok(None)
        })
    }

    fn create_account_op(&self) -> AccountOp {
        let accounts = self.accounts.clone();
        Operation::new("create-account", move |_ctx, token| async move {
            tracing::debug!(target: TRACING_TARGET, "creating new account");

            let created = tokio::select! {
                _ = token.cancelled() => return Err(WorkError::Cancelled),
                result = accounts.create_account() => result.map_err(|error| {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %error,
                        "failed to create new account"
                    );
                    AccountError::from(error)
                })?,
            };

            tracing::debug!(target: TRACING_TARGET, "created new account");
            Ok(Some(TransitionValue::Account(StoredAccountData {
                identifier: created.id,
                number: created.number,
                expiry: created.expiry,
            })))
        })
    }

    fn fetch_account_op(&self, number: AccountNumber) -> AccountOp {
        let accounts = self.accounts.clone();
        Operation::new("fetch-account", move |_ctx, token| async move {
            tracing::debug!(target: TRACING_TARGET, "requesting account data");

            let data = tokio::select! {
                _ = token.cancelled() => return Err(WorkError::Cancelled),
                result = accounts.fetch_account(&number) => result.map_err(|error| {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %error,
                        "failed to receive account data"
                    );
                    AccountError::from(error)
                })?,
            };

            tracing::debug!(target: TRACING_TARGET, "received account data");
            Ok(Some(TransitionValue::Account(StoredAccountData {
                identifier: data.id,
                number,
                expiry: data.expiry,
            })))
        })
    }

    /// Registers a new device, remembering the account number first.
    fn create_device_op(&self) -> AccountOp {
        let interactor = self.interactor.clone();
        let devices = self.devices.clone();
        Operation::new(
            "create-device",
            move |mut ctx: InputContext<TransitionValue>, token| async move {
                let account = ctx
                    .take(slots::ACCOUNT)
                    .map_err(AccountError::from)?
                    .into_account(slots::ACCOUNT)?;

                tracing::debug!(target: TRACING_TARGET, "storing last used account");
                if let Err(error) = interactor.set_last_used_account(&account.number) {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %error,
                        "failed to store last used account number"
                    );
                }

                tracing::debug!(target: TRACING_TARGET, "creating device");
                let keys = KeyPair::generate();
                let request = CreateDeviceRequest::new(keys.public.clone());

                let device = tokio::select! {
                    _ = token.cancelled() => return Err(WorkError::Cancelled),
                    result = devices.create_device(&account.number, request) => {
                        result.map_err(|error| {
                            tracing::error!(
                                target: TRACING_TARGET,
                                error = %error,
                                "failed to create device"
                            );
                            AccountError::from(error)
                        })?
                    }
                };

                Ok(Some(TransitionValue::DeviceCreated { keys, device }))
            },
        )
    }

    /// Persists settings and the logged-in device state; the transition's
    /// designated result producer.
    fn save_settings_op(&self) -> AccountOp {
        let interactor = self.interactor.clone();
        Operation::new(
            "save-settings",
            move |mut ctx: InputContext<TransitionValue>, _token| async move {
                // Does not observe the cancellation token: once reached,
                // the save commits.
                tracing::debug!(target: TRACING_TARGET, "saving settings");

                let account = ctx
                    .take(slots::ACCOUNT)
                    .map_err(AccountError::from)?
                    .into_account(slots::ACCOUNT)?;
                let (keys, device) = ctx
                    .take(slots::DEVICE)
                    .map_err(AccountError::from)?
                    .into_device(slots::DEVICE)?;

                let state = DeviceState::LoggedIn {
                    account: account.clone(),
                    device: StoredDeviceData::new(device, keys.private),
                };
                interactor.set_settings(TunnelSettings::default(), true);
                interactor.set_device_state(state, true);

                Ok(Some(TransitionValue::Account(account)))
            },
        )
    }
}

impl std::fmt::Debug for AccountOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountOrchestrator").finish_non_exhaustive()
    }
}
