//! Backend abstraction for list reads and record mutations.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{Record, RemoteListResult, ResourceKind, StatusChange};
use crate::fetch::{FetchError, QueryKey};

/// Response of the file upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}

/// Operations every dashboard backend provides.
///
/// Implementations perform a single attempt; retries and coalescing live in
/// [`QueryClient`](crate::fetch::QueryClient).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Loads one page of `key.resource` using `key.params` as the query string.
    async fn fetch_list(&self, key: &QueryKey) -> Result<RemoteListResult<Record>, FetchError>;

    async fn update_status(&self, resource: ResourceKind, change: &StatusChange) -> Result<(), FetchError>;

    async fn delete_record(&self, resource: ResourceKind, id: &str) -> Result<(), FetchError>;

    /// Uploads a local file for a form field, returning its public URL.
    async fn upload_file(&self, field: &str, path: &Path) -> Result<UploadedFile, FetchError>;

    /// Deletes a previously uploaded file by its public URL.
    async fn delete_file(&self, url: &str) -> Result<(), FetchError>;
}
