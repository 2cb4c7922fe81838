//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use veil_ops::prelude::*;
//! ```

pub use crate::engine::{
    OpOutcome, OperationQueue, QueueConfig, TerminalOutcome, TransitionHandle, TransitionReport,
};
pub use crate::error::{OpsError, OpsResult};
pub use crate::graph::OperationGraph;
pub use crate::node::{
    Condition, ConditionOutcome, InputContext, Injector, OpId, OpState, Operation, WorkError,
};
