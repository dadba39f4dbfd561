//! Storage backend abstraction.
//!
//! The dashboard keeps a handful of small values on the client: the current
//! region selection and pending upload bookkeeping. [`Storage`] is a plain
//! string-keyed store of JSON values so that each owner decides its own shape.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::error::Result;

/// Abstraction over local persistent key-value stores.
///
/// # Implementations
///
/// - [`JsonStorage`](crate::storage::JsonStorage): JSON file with atomic writes
/// - [`MemoryStorage`]: process-local, used by tests and `--no-persist`
pub trait Storage: Send {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the read operation fails.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`. Returns whether a value was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    fn remove(&mut self, key: &str) -> Result<bool>;

    /// All keys currently stored, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read operation fails.
    fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, Value>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}
