//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use veil_account::prelude::*;
//! ```

pub use crate::account::{AccountNumber, StoredAccountData};
pub use crate::api::{AccountsApi, ApiError, ApiResult, DevicesApi};
pub use crate::device::{Device, DeviceState, KeyPair, StoredDeviceData};
pub use crate::error::{AccountError, AccountResult};
pub use crate::interactor::{TunnelConfigurator, TunnelInteractor};
pub use crate::orchestrator::{AccountOrchestrator, AccountTransitionHandle, TransitionOutcome};
pub use crate::settings::TunnelSettings;
pub use crate::transition::{AccountTransition, TransitionValue};
