//! JSON file-based storage backend.
//!
//! A human-readable stand-in for the browser's local storage. Writes go to a
//! temporary file which is then renamed over the target, so the file on disk
//! is never half-written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::{RentAdminError, Result};
use crate::storage::backend::Storage;

/// Top-level structure serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageData {
    /// Version of the storage format for future migrations.
    version: u32,

    #[serde(default)]
    entries: BTreeMap<String, Value>,
}

impl Default for StorageData {
    fn default() -> Self {
        Self {
            version: 1,
            entries: BTreeMap::new(),
        }
    }
}

/// JSON file storage backend.
///
/// The whole store is kept in memory and persisted after every change.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "entries": {
///     "selectedState": { "id": "st-4", "name": "Goa" },
///     "appCountry": "IN",
///     "upload:coverImage": { "add": ["https://cdn/x.png"], "delete": [] }
///   }
/// }
/// ```
pub struct JsonStorage {
    file_path: PathBuf,
    data: StorageData,
    /// Tracks if data has been modified since last save.
    dirty: bool,
}

impl JsonStorage {
    /// Creates or opens a JSON store. Parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - File exists but contains invalid JSON
    /// - File permissions prevent reading
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rentadmin::storage::JsonStorage;
    /// use std::path::PathBuf;
    ///
    /// let storage = JsonStorage::new(PathBuf::from("/tmp/rentadmin/selection.json"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing JSON storage");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty storage");
            StorageData::default()
        };

        tracing::debug!(entry_count = data.entries.len(), "storage initialized");

        Ok(Self {
            file_path,
            data,
            dirty: false,
        })
    }

    fn load_from_file(path: &Path) -> Result<StorageData> {
        let contents = std::fs::read_to_string(path)?;
        let data: StorageData = serde_json::from_str(&contents)
            .map_err(|e| RentAdminError::Storage(format!("failed to parse JSON: {e}")))?;

        tracing::debug!(version = data.version, entries = data.entries.len(), "loaded storage data");
        Ok(data)
    }

    fn save_to_file(&mut self) -> Result<()> {
        if !self.dirty {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| RentAdminError::Storage(format!("failed to serialize JSON: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty = false;
        tracing::debug!(path = ?self.file_path, "storage saved");
        Ok(())
    }
}

impl Storage for JsonStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let _span = tracing::debug_span!("json_set", key = %key).entered();

        if self.data.entries.get(key) == Some(&value) {
            tracing::trace!("value unchanged");
            return Ok(());
        }

        self.data.entries.insert(key.to_string(), value);
        self.dirty = true;
        self.save_to_file()
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let _span = tracing::debug_span!("json_remove", key = %key).entered();

        let existed = self.data.entries.remove(key).is_some();
        if existed {
            self.dirty = true;
            self.save_to_file()?;
        }
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.entries.keys().cloned().collect())
    }
}

impl Drop for JsonStorage {
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("saving dirty data on drop");
            if let Err(e) = self.save_to_file() {
                tracing::error!(error = %e, "failed to save on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let mut storage = JsonStorage::new(path.clone()).unwrap();
            storage.set("appCountry", json!("IN")).unwrap();
            storage.set("selectedState", json!({"id": "st-1", "name": "Goa"})).unwrap();
        }

        let storage = JsonStorage::new(path.clone()).unwrap();
        assert_eq!(storage.get("appCountry").unwrap(), Some(json!("IN")));
        assert_eq!(storage.keys().unwrap(), vec!["appCountry", "selectedState"]);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(JsonStorage::new(path), Err(RentAdminError::Storage(_))));
    }

    #[test]
    fn remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path().join("store.json")).unwrap();
        storage.set("parentState", json!({"id": "p"})).unwrap();

        assert!(storage.remove("parentState").unwrap());
        assert!(!storage.remove("parentState").unwrap());
    }
}
