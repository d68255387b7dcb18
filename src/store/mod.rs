mod error;
mod memory;
mod settings;
mod yaml_file;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use settings::{Credentials, Settings};
pub use yaml_file::YamlFileStore;

/// A value as held by a [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Str(String),
    Float(f64),
    Bool(bool),
}

/// Typed reads and batched writes over a persistent key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<StoredValue>;

    /// Writes every entry or none of them.
    fn put_all(&mut self, entries: &[(&str, StoredValue)]) -> Result<(), StoreError>;

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            StoredValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            StoredValue::Float(v) => Some(v),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            StoredValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}
