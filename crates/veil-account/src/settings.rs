//! Tunnel settings persisted by the terminal save operation.

use serde::{Deserialize, Serialize};

/// Settings persisted alongside the device state.
///
/// Relay selection, DNS and obfuscation options live with their own
/// subsystems; this core only resets the settings to their fresh-login
/// defaults when a transition completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelSettings {
    /// Whether the tunnel should come up automatically after login.
    pub auto_connect: bool,
    /// Whether traffic outside the tunnel is blocked while disconnected.
    pub lockdown_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_login_defaults() {
        let settings = TunnelSettings::default();
        assert!(!settings.auto_connect);
        assert!(!settings.lockdown_mode);
    }
}
