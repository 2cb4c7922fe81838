//! Account transition error types.

use thiserror::Error;
use veil_ops::OpsError;

use crate::api::ApiError;

/// Result type for account transition operations.
pub type AccountResult<T> = Result<T, AccountError>;

/// Errors that resolve an account transition to a failure.
#[derive(Debug, Error)]
pub enum AccountError {
    /// A REST collaborator call failed; for blocking operations this
    /// becomes the transition's terminal failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Malformed operation graph or broken scheduler invariant.
    #[error("operation graph contract violated: {0}")]
    Graph(#[from] OpsError),

    /// An injector populated an input slot with a value of the wrong
    /// shape.
    #[error("unexpected value in input slot {slot:?}")]
    UnexpectedValue {
        /// The offending slot name.
        slot: &'static str,
    },
}
