#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod engine;
mod error;
pub mod graph;
pub mod node;

#[doc(hidden)]
pub mod prelude;

pub use error::{OpsError, OpsResult};

/// Tracing target for operation graph internals.
pub const TRACING_TARGET: &str = "veil_ops";
