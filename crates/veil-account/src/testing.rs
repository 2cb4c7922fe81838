//! Scripted collaborator doubles for transition tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::account::{AccountNumber, StoredAccountData};
use crate::api::{AccountData, AccountsApi, ApiError, ApiResult, DevicesApi, NewAccount};
use crate::device::{
    CreateDeviceRequest, Device, DevicePrivateKey, DeviceState, KeyPair, StoredDeviceData,
};
use crate::interactor::{SettingsError, TunnelConfigError, TunnelConfigurator, TunnelInteractor};
use crate::settings::TunnelSettings;

/// Shared, ordered record of collaborator calls.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }
}

/// Scripted accounts endpoint double.
///
/// Responses are consumed on use; an unscripted call fails with a
/// transport error rather than panicking inside the queue.
pub(crate) struct ScriptedAccountsApi {
    log: Arc<CallLog>,
    create_response: Mutex<Option<ApiResult<NewAccount>>>,
    fetch_response: Mutex<Option<ApiResult<AccountData>>>,
    /// Notified when a call starts; lets tests cancel mid-flight.
    pub started: Arc<Notify>,
    hang: bool,
}

impl ScriptedAccountsApi {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            create_response: Mutex::new(None),
            fetch_response: Mutex::new(None),
            started: Arc::new(Notify::new()),
            hang: false,
        }
    }

    pub fn with_create(self, response: ApiResult<NewAccount>) -> Self {
        *self.create_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_fetch(self, response: ApiResult<AccountData>) -> Self {
        *self.fetch_response.lock().unwrap() = Some(response);
        self
    }

    /// Makes calls block forever, so tests can observe cancellation.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }
}

#[async_trait]
impl AccountsApi for ScriptedAccountsApi {
    async fn create_account(&self) -> ApiResult<NewAccount> {
        self.log.record("create_account");
        self.started.notify_one();
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.create_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(ApiError::Transport("unscripted create_account".into())))
    }

    async fn fetch_account(&self, number: &AccountNumber) -> ApiResult<AccountData> {
        self.log.record(format!("fetch_account:{number}"));
        self.started.notify_one();
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.fetch_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(ApiError::Transport("unscripted fetch_account".into())))
    }
}

/// Scripted devices endpoint double.
pub(crate) struct ScriptedDevicesApi {
    log: Arc<CallLog>,
    delete_response: Mutex<Option<ApiResult<bool>>>,
    create_response: Mutex<Option<ApiResult<Device>>>,
}

impl ScriptedDevicesApi {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            delete_response: Mutex::new(None),
            create_response: Mutex::new(None),
        }
    }

    pub fn with_delete(self, response: ApiResult<bool>) -> Self {
        *self.delete_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_create(self, response: ApiResult<Device>) -> Self {
        *self.create_response.lock().unwrap() = Some(response);
        self
    }
}

#[async_trait]
impl DevicesApi for ScriptedDevicesApi {
    async fn delete_device(&self, _number: &AccountNumber, device_id: &str) -> ApiResult<bool> {
        self.log.record(format!("delete_device:{device_id}"));
        self.delete_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(true))
    }

    async fn create_device(
        &self,
        number: &AccountNumber,
        _request: CreateDeviceRequest,
    ) -> ApiResult<Device> {
        self.log.record(format!("create_device:{number}"));
        self.create_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(ApiError::Transport("unscripted create_device".into())))
    }
}

/// In-memory interactor double.
pub(crate) struct FakeInteractor {
    log: Arc<CallLog>,
    state: Mutex<DeviceState>,
    fail_last_used: bool,
    tunnel: Option<Arc<dyn TunnelConfigurator>>,
    /// Notified when a logged-in device state is saved.
    pub saved: Arc<Notify>,
}

impl FakeInteractor {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            state: Mutex::new(DeviceState::LoggedOut),
            fail_last_used: false,
            tunnel: None,
            saved: Arc::new(Notify::new()),
        }
    }

    pub fn with_state(self, state: DeviceState) -> Self {
        *self.state.lock().unwrap() = state;
        self
    }

    pub fn failing_last_used(mut self) -> Self {
        self.fail_last_used = true;
        self
    }

    pub fn with_tunnel(mut self, tunnel: Arc<dyn TunnelConfigurator>) -> Self {
        self.tunnel = Some(tunnel);
        self
    }
}

impl TunnelInteractor for FakeInteractor {
    fn device_state(&self) -> DeviceState {
        self.state.lock().unwrap().clone()
    }

    fn set_device_state(&self, state: DeviceState, persist: bool) {
        let tag = match &state {
            DeviceState::LoggedIn { .. } => "logged-in",
            DeviceState::LoggedOut => "logged-out",
            DeviceState::Revoked => "revoked",
        };
        self.log
            .record(format!("set_device_state:{tag}:persist={persist}"));
        *self.state.lock().unwrap() = state;
        if tag == "logged-in" {
            self.saved.notify_one();
        }
    }

    fn set_settings(&self, _settings: TunnelSettings, persist: bool) {
        self.log.record(format!("set_settings:persist={persist}"));
    }

    fn set_last_used_account(&self, number: &AccountNumber) -> Result<(), SettingsError> {
        self.log.record(format!("set_last_used_account:{number}"));
        if self.fail_last_used {
            Err(SettingsError("store is read-only".into()))
        } else {
            Ok(())
        }
    }

    fn prepare_for_vpn_configuration_deletion(&self) {
        self.log.record("prepare_for_vpn_configuration_deletion");
    }

    fn reset_tunnel_status(&self) {
        self.log.record("reset_tunnel_status");
    }

    fn tunnel(&self) -> Option<Arc<dyn TunnelConfigurator>> {
        self.tunnel.clone()
    }
}

/// VPN configuration double.
pub(crate) struct FakeTunnel {
    log: Arc<CallLog>,
    fail: bool,
}

impl FakeTunnel {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self { log, fail: false }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl TunnelConfigurator for FakeTunnel {
    async fn remove_from_preferences(&self) -> Result<(), TunnelConfigError> {
        self.log.record("remove_from_preferences");
        if self.fail {
            Err(TunnelConfigError("permission denied".into()))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn sample_number() -> AccountNumber {
    "1111222233334444".into()
}

pub(crate) fn sample_expiry() -> jiff::Timestamp {
    "2027-02-01T00:00:00Z".parse().unwrap()
}

pub(crate) fn sample_new_account() -> NewAccount {
    NewAccount {
        id: "A1".into(),
        number: sample_number(),
        expiry: sample_expiry(),
    }
}

pub(crate) fn sample_account_data() -> AccountData {
    AccountData {
        id: "A1".into(),
        expiry: sample_expiry(),
    }
}

pub(crate) fn sample_device() -> Device {
    Device {
        id: "D1".into(),
        name: "happy-falcon".into(),
        public_key: KeyPair::generate().public,
        hijack_dns: false,
        created: "2026-08-01T00:00:00Z".parse().unwrap(),
        ipv4_address: "10.64.0.2/32".parse().unwrap(),
        ipv6_address: "fc00:bbbb:bbbb:bb01::2/128".parse().unwrap(),
    }
}

pub(crate) fn logged_in_state() -> DeviceState {
    DeviceState::LoggedIn {
        account: StoredAccountData {
            identifier: "A0".into(),
            number: "9999888877776666".into(),
            expiry: sample_expiry(),
        },
        device: StoredDeviceData::new(sample_device(), DevicePrivateKey::generate()),
    }
}
