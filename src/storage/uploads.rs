//! Per-field bookkeeping of uploaded and removed files.
//!
//! Uploading happens as soon as a file is picked, before the form is saved.
//! The tracker remembers those URLs so that an abandoned form can clean them
//! up, and remembers removed files so that they are only deleted once the form
//! is actually saved.

use crate::domain::error::{RentAdminError, Result};
use crate::storage::backend::Storage;
use crate::storage::models::UploadRecord;

const KEY_PREFIX: &str = "upload:";

pub struct UploadTracker {
    storage: Box<dyn Storage>,
}

impl UploadTracker {
    #[must_use]
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    fn key(field: &str) -> String {
        format!("{KEY_PREFIX}{field}")
    }

    /// Current record of `field`, empty when nothing is tracked.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or holds a malformed record.
    pub fn record(&self, field: &str) -> Result<UploadRecord> {
        match self.storage.get(&Self::key(field))? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| RentAdminError::Storage(format!("malformed upload record for {field}: {e}"))),
            None => Ok(UploadRecord::default()),
        }
    }

    fn store(&mut self, field: &str, record: &UploadRecord) -> Result<()> {
        let key = Self::key(field);
        if record.is_empty() {
            return self.storage.remove(&key).map(drop);
        }
        let value = serde_json::to_value(record)
            .map_err(|e| RentAdminError::Storage(format!("failed to serialize upload record: {e}")))?;
        self.storage.set(&key, value)
    }

    /// Records a freshly uploaded file.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or persisted.
    pub fn record_upload(&mut self, field: &str, url: &str) -> Result<()> {
        let mut record = self.record(field)?;
        if !record.add.iter().any(|u| u == url) {
            record.add.push(url.to_string());
        }
        tracing::debug!(field = %field, url = %url, "upload recorded");
        self.store(field, &record)
    }

    /// Marks a file for deletion once the form is saved.
    ///
    /// A file uploaded during this edit is simply forgotten and returned for
    /// immediate cleanup instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or persisted.
    pub fn mark_removed(&mut self, field: &str, url: &str) -> Result<Option<String>> {
        let mut record = self.record(field)?;
        let orphan = if let Some(pos) = record.add.iter().position(|u| u == url) {
            Some(record.add.remove(pos))
        } else {
            if !record.delete.iter().any(|u| u == url) {
                record.delete.push(url.to_string());
            }
            None
        };
        self.store(field, &record)?;
        Ok(orphan)
    }

    /// The form was saved: returns the files to delete server-side and clears the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or cleared.
    pub fn commit(&mut self, field: &str) -> Result<Vec<String>> {
        let record = self.record(field)?;
        self.storage.remove(&Self::key(field))?;
        tracing::debug!(field = %field, kept = record.add.len(), to_delete = record.delete.len(), "uploads committed");
        Ok(record.delete)
    }

    /// The form was abandoned: returns the orphaned uploads and clears the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or cleared.
    pub fn abandon(&mut self, field: &str) -> Result<Vec<String>> {
        let record = self.record(field)?;
        self.storage.remove(&Self::key(field))?;
        tracing::debug!(field = %field, orphaned = record.add.len(), "uploads abandoned");
        Ok(record.add)
    }

    /// Fields with pending records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn pending_fields(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::MemoryStorage;

    fn tracker() -> UploadTracker {
        UploadTracker::new(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn commit_returns_removed_files() {
        let mut uploads = tracker();
        uploads.record_upload("gallery", "https://cdn/new.png").unwrap();
        assert_eq!(uploads.mark_removed("gallery", "https://cdn/old.png").unwrap(), None);

        assert_eq!(uploads.commit("gallery").unwrap(), vec!["https://cdn/old.png"]);
        assert!(uploads.record("gallery").unwrap().is_empty());
        assert!(uploads.pending_fields().unwrap().is_empty());
    }

    #[test]
    fn abandon_returns_orphaned_uploads() {
        let mut uploads = tracker();
        uploads.record_upload("logo", "https://cdn/a.png").unwrap();
        uploads.record_upload("logo", "https://cdn/b.png").unwrap();
        uploads.record_upload("logo", "https://cdn/b.png").unwrap();

        assert_eq!(uploads.pending_fields().unwrap(), vec!["logo"]);
        assert_eq!(uploads.abandon("logo").unwrap(), vec!["https://cdn/a.png", "https://cdn/b.png"]);
    }

    #[test]
    fn removing_a_fresh_upload_orphans_it_directly() {
        let mut uploads = tracker();
        uploads.record_upload("logo", "https://cdn/a.png").unwrap();

        assert_eq!(
            uploads.mark_removed("logo", "https://cdn/a.png").unwrap().as_deref(),
            Some("https://cdn/a.png")
        );
        assert!(uploads.record("logo").unwrap().is_empty());
    }
}
