//! Account data types.

use derive_more::{Display, From, Into};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// An account number.
///
/// Account numbers are login credentials in this product, so `Debug`
/// redacts all but the last four digits; `Display` renders the full
/// number for the REST collaborators.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, From, Into)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Creates an account number.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Returns the account number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = self
            .0
            .len()
            .checked_sub(4)
            .and_then(|start| self.0.get(start..))
            .unwrap_or("");
        write!(f, "AccountNumber(****{suffix})")
    }
}

impl From<&str> for AccountNumber {
    fn from(number: &str) -> Self {
        Self(number.to_owned())
    }
}

/// Account data persisted locally after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAccountData {
    /// Server-side account identifier.
    pub identifier: String,
    /// The account number used to log in.
    pub number: AccountNumber,
    /// When the account's paid time runs out.
    pub expiry: Timestamp,
}

impl StoredAccountData {
    /// Returns whether the account's paid time has run out at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expiry <= now
    }
}
