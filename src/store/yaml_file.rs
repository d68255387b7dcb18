use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use serde_yaml::Value;

use super::{KeyValueStore, StoreError, StoredValue};

/// Key-value store persisted as a flat YAML mapping. Each batch replaces the
/// file through a temporary sibling and a rename, so a reader sees either the
/// old mapping or the new one.
pub struct YamlFileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl YamlFileStore {
    /// Opens the store. A file that does not parse is treated as empty and
    /// replaced on the next write.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&content).unwrap_or_else(|e| {
                    log::warn!(
                        "Ignoring unreadable settings file {}: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                })
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(values)?;
        let tmp = self.path.with_extension("yaml.tmp");
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for YamlFileStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        match self.values.get(key)? {
            Value::String(s) => Some(StoredValue::Str(s.clone())),
            Value::Number(n) => n.as_f64().map(StoredValue::Float),
            Value::Bool(b) => Some(StoredValue::Bool(*b)),
            _ => None,
        }
    }

    fn put_all(&mut self, entries: &[(&str, StoredValue)]) -> Result<(), StoreError> {
        let mut values = self.values.clone();
        for (key, value) in entries {
            let value = match value {
                StoredValue::Str(s) => Value::String(s.clone()),
                StoredValue::Float(v) => Value::from(*v),
                StoredValue::Bool(b) => Value::Bool(*b),
            };
            values.insert(key.to_string(), value);
        }
        self.persist(&values)?;
        self.values = values;
        Ok(())
    }
}
