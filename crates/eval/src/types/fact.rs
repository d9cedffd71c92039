//! Fact store: what is known about one user.

use std::collections::BTreeMap;

use super::{Change, FactKey, FactValue};

/// Key-value store of facts for one session.
///
/// Facts may be overwritten as a conversation progresses but are never
/// deleted. A mutation that changes a value returns its [`Change`];
/// setting an identical value returns nothing. The store keeps no queue
/// of past changes.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    values: BTreeMap<FactKey, FactValue>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FactKey) -> Option<&FactValue> {
        self.values.get(key)
    }

    /// Set a fact. Returns the change event if the stored value changed.
    pub fn set(&mut self, key: FactKey, value: FactValue) -> Option<Change> {
        if self.values.get(&key) == Some(&value) {
            return None;
        }
        self.values.insert(key.clone(), value);
        Some(Change::Fact(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FactKey, &FactValue)> {
        self.values.iter()
    }
}
