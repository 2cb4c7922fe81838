//! Operation graph error types.
//!
//! Every variant here is a programming-contract violation: a malformed
//! graph or a broken scheduler invariant. Collaborator failures travel
//! through the graph as the caller's own error type instead.

use thiserror::Error;

use crate::node::OpId;

/// Result type for graph construction and contract checks.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors produced by graph construction or by contract violations at
/// execution time.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Graph failed structural validation.
    #[error("invalid operation graph: {0}")]
    InvalidGraph(String),

    /// An edge or injector references an operation that is not in the graph.
    #[error("unknown operation {0}")]
    UnknownOperation(OpId),

    /// An injector wrote an input slot that was already populated.
    #[error("input slot {slot:?} written twice")]
    DuplicateSlot {
        /// Name of the slot written twice.
        slot: &'static str,
    },

    /// A work body read an input slot that no injector populated.
    #[error("input slot {slot:?} was never populated")]
    MissingSlot {
        /// Name of the missing slot.
        slot: &'static str,
    },

    /// Scheduler invariant broken.
    #[error("internal error: {0}")]
    Internal(String),
}
