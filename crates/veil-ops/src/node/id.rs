//! Operation identifier type.

use std::str::FromStr;

use derive_more::{Debug, Display, From, Into};
use uuid::Uuid;

/// Unique identifier for an operation in a graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
pub struct OpId(Uuid);

impl OpId {
    /// Creates a new random operation ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an operation ID from an existing UUID.
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OpId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for OpId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

impl AsRef<Uuid> for OpId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}
