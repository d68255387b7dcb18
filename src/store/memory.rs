use std::collections::HashMap;

use super::{KeyValueStore, StoreError, StoredValue};

/// Volatile store. Settings survive only as long as the value does.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).cloned()
    }

    fn put_all(&mut self, entries: &[(&str, StoredValue)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.values.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}
