//! Write-once input slots for multi-input operations.

use std::collections::HashMap;

use crate::error::{OpsError, OpsResult};

/// Accumulating input context owned by a consuming operation.
///
/// Injectors populate named slots before the operation starts; the work
/// body reduces the context to concrete values by taking the slots it
/// needs. Each slot is write-once, and reading a slot that was never
/// populated is a contract violation — for a well-formed graph the
/// consuming operation's conditions prevent it from running when an
/// upstream producer did not finish.
#[derive(Debug)]
pub struct InputContext<V> {
    slots: HashMap<&'static str, V>,
}

impl<V> InputContext<V> {
    /// Creates an empty input context.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Writes a slot. Fails if the slot was already populated.
    pub fn put(&mut self, slot: &'static str, value: V) -> OpsResult<()> {
        if self.slots.contains_key(slot) {
            return Err(OpsError::DuplicateSlot { slot });
        }
        self.slots.insert(slot, value);
        Ok(())
    }

    /// Takes a slot out of the context. Fails if it was never populated.
    pub fn take(&mut self, slot: &'static str) -> OpsResult<V> {
        self.slots
            .remove(slot)
            .ok_or(OpsError::MissingSlot { slot })
    }

    /// Returns a reference to a slot's value, if populated.
    pub fn get(&self, slot: &'static str) -> Option<&V> {
        self.slots.get(slot)
    }

    /// Returns whether a slot is populated.
    pub fn contains(&self, slot: &'static str) -> bool {
        self.slots.contains_key(slot)
    }

    /// Returns the number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether no slots are populated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<V> Default for InputContext<V> {
    fn default() -> Self {
        Self::new()
    }
}
