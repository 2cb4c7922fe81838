//! Local state and persistence collaborator seams.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::account::AccountNumber;
use crate::device::DeviceState;
use crate::settings::TunnelSettings;

/// Error from the settings store.
#[derive(Debug, Clone, Error)]
#[error("settings store error: {0}")]
pub struct SettingsError(pub String);

/// Error from the platform VPN configuration store.
#[derive(Debug, Clone, Error)]
#[error("VPN configuration error: {0}")]
pub struct TunnelConfigError(pub String);

/// Platform VPN configuration handle.
#[async_trait]
pub trait TunnelConfigurator: Send + Sync {
    /// Removes the VPN configuration from system preferences.
    ///
    /// Failures are logged by the caller and never escalated: local state
    /// has already been reset by the time this runs.
    async fn remove_from_preferences(&self) -> Result<(), TunnelConfigError>;
}

/// Local tunnel state and persistence owned by the session layer.
///
/// The `set_*` methods are fire-and-log side effects: the transition does
/// not fail when a write cannot be persisted, unless the operation
/// invoking it was declared blocking at graph construction.
pub trait TunnelInteractor: Send + Sync {
    /// Returns the current device state.
    fn device_state(&self) -> DeviceState;

    /// Replaces the device state, optionally persisting it.
    fn set_device_state(&self, state: DeviceState, persist: bool);

    /// Replaces the tunnel settings, optionally persisting them.
    fn set_settings(&self, settings: TunnelSettings, persist: bool);

    /// Records the most recently used account number.
    fn set_last_used_account(&self, number: &AccountNumber) -> Result<(), SettingsError>;

    /// Tells the session layer to unsubscribe from VPN status
    /// notifications before the configuration is deleted.
    fn prepare_for_vpn_configuration_deletion(&self);

    /// Resets the observed tunnel status to disconnected.
    fn reset_tunnel_status(&self);

    /// Returns the active VPN configuration handle, if one is set.
    fn tunnel(&self) -> Option<Arc<dyn TunnelConfigurator>>;
}
