//! Operation graph structure.
//!
//! This module provides the container a transition's operations are wired
//! into before execution:
//! - [`OperationGraph`]: Operations plus must-finish-before edges
//! - [`DepEdge`]: Edge data for dependency edges

mod graph;

pub use graph::{DepEdge, OperationGraph};
