#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod account;
pub mod api;
pub mod device;
mod error;
pub mod interactor;
mod orchestrator;
pub mod settings;
mod transition;

#[doc(hidden)]
pub mod prelude;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AccountError, AccountResult};
pub use orchestrator::{AccountOrchestrator, AccountTransitionHandle, TransitionOutcome};
pub use transition::{AccountTransition, TransitionValue};

/// Tracing target for account transition operations.
pub const TRACING_TARGET: &str = "veil_account";
