//! Transition kinds and the values flowing between their operations.

use crate::account::{AccountNumber, StoredAccountData};
use crate::device::{Device, KeyPair};
use crate::error::AccountError;

/// Business intent for one account transition.
#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum AccountTransition {
    /// Create a new account and log in on it.
    New,
    /// Log in on an existing account.
    Existing(AccountNumber),
    /// Log out and clear local device state.
    Unset,
}

impl AccountTransition {
    /// Human-readable task name for diagnostics.
    pub fn task_name(&self) -> &'static str {
        match self {
            Self::New => "set new account",
            Self::Existing(_) => "set existing account",
            Self::Unset => "unset account",
        }
    }
}

/// Value passed along injector edges between account operations.
#[derive(Debug, Clone)]
pub enum TransitionValue {
    /// Output of the account fetch-or-create operation.
    Account(StoredAccountData),
    /// Output of the device registration operation.
    DeviceCreated {
        /// The locally generated key pair.
        keys: KeyPair,
        /// The registered device.
        device: Device,
    },
}

impl TransitionValue {
    pub(crate) fn into_account(self, slot: &'static str) -> Result<StoredAccountData, AccountError> {
        match self {
            Self::Account(account) => Ok(account),
            Self::DeviceCreated { .. } => Err(AccountError::UnexpectedValue { slot }),
        }
    }

    pub(crate) fn into_device(self, slot: &'static str) -> Result<(KeyPair, Device), AccountError> {
        match self {
            Self::DeviceCreated { keys, device } => Ok((keys, device)),
            Self::Account(_) => Err(AccountError::UnexpectedValue { slot }),
        }
    }
}

/// Input slot names used by the account transition graph.
pub(crate) mod slots {
    pub const ACCOUNT: &str = "account";
    pub const DEVICE: &str = "device";
}
