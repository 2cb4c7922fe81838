//! Operation queue and scheduling.
//!
//! This module provides the runtime for executing an operation graph:
//! - [`OperationQueue`]: The scheduler driving one transition
//! - [`QueueConfig`]: Configuration options
//! - [`TransitionHandle`]: Caller handle for cancellation and the result
//! - [`TransitionReport`] / [`OpOutcome`]: Per-operation records
//! - [`TerminalOutcome`]: The single outcome delivered per transition

mod config;
mod handle;
mod outcome;
mod queue;

pub use config::{QueueConfig, QueueConfigBuilder};
pub use handle::TransitionHandle;
pub use outcome::{OpOutcome, OpRecord, TerminalOutcome, TransitionReport};
pub use queue::OperationQueue;
