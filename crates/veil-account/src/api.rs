//! REST collaborator seams.
//!
//! Transport, authentication and retry/backoff policy belong to the
//! implementations behind these traits. Each call returns exactly one
//! terminal result; in-flight calls are cancelled by dropping the future,
//! which the operation bodies do by racing it against their cancellation
//! token.

use async_trait::async_trait;
use jiff::Timestamp;
use thiserror::Error;

use crate::account::AccountNumber;
use crate::device::{CreateDeviceRequest, Device};

/// Result type for REST collaborator calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the REST collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The endpoint rejected the request with a known error code.
    #[error("REST error: {code}")]
    Rest {
        /// Server error code, e.g. `invalid-account`.
        code: String,
    },

    /// Transport-level failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Creates a REST error with the given server error code.
    pub fn rest(code: impl Into<String>) -> Self {
        Self::Rest { code: code.into() }
    }
}

/// A newly created account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Server-side account identifier.
    pub id: String,
    /// The generated account number.
    pub number: AccountNumber,
    /// When the account's paid time runs out.
    pub expiry: Timestamp,
}

/// Account data for an existing account number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    /// Server-side account identifier.
    pub id: String,
    /// When the account's paid time runs out.
    pub expiry: Timestamp,
}

/// Accounts endpoint.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Creates a new account.
    async fn create_account(&self) -> ApiResult<NewAccount>;

    /// Fetches account data for an existing account number.
    async fn fetch_account(&self, number: &AccountNumber) -> ApiResult<AccountData>;
}

/// Devices endpoint.
#[async_trait]
pub trait DevicesApi: Send + Sync {
    /// Deletes a device. Returns `Ok(false)` when the device was already
    /// gone.
    async fn delete_device(&self, number: &AccountNumber, device_id: &str) -> ApiResult<bool>;

    /// Registers a new device on the account.
    async fn create_device(
        &self,
        number: &AccountNumber,
        request: CreateDeviceRequest,
    ) -> ApiResult<Device>;
}
