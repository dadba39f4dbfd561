//! Offline backend serving listings from an in-memory JSON fixture.
//!
//! The fixture behaves like the real list endpoints: it applies search,
//! filters, sort order and paging on the server side, applies mutations to its
//! own data, and records every call. Latency and one-shot failures can be
//! injected, which makes it the backend of choice for tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::error::{RentAdminError, Result};
use crate::domain::{Record, RemoteListResult, ResourceKind, SortOrder, StatusChange};
use crate::fetch::backend::{Backend, UploadedFile};
use crate::fetch::{FetchError, QueryKey};

const RESERVED_PARAMS: [&str; 4] = ["page", "limit", "sortOrder", "search"];

/// A call received by the fixture, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureCall {
    List(QueryKey),
    UpdateStatus { resource: ResourceKind, change: StatusChange },
    Delete { resource: ResourceKind, id: String },
    Upload { field: String },
    DeleteFile { url: String },
}

#[derive(Default)]
pub struct FixtureBackend {
    data: Mutex<HashMap<ResourceKind, Vec<Value>>>,
    failures: Mutex<VecDeque<FetchError>>,
    calls: Mutex<Vec<FixtureCall>>,
    latency: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FixtureBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a fixture file shaped as `{ "<resource>": [ {...}, ... ], ... }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a JSON object of
    /// arrays, or names an unknown resource.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let root: serde_json::Map<String, Value> = serde_json::from_str(&contents)
            .map_err(|e| RentAdminError::Config(format!("fixture {}: {e}", path.display())))?;

        let mut backend = Self::new();
        for (name, rows) in root {
            let resource: ResourceKind = name.parse()?;
            let Value::Array(rows) = rows else {
                return Err(RentAdminError::Config(format!("fixture entry '{name}' must be an array")));
            };
            backend = backend.with_records(resource, rows);
        }

        tracing::debug!(path = %path.display(), "fixture loaded");
        Ok(backend)
    }

    /// Replaces the rows of `resource`. Rows are kept in creation order.
    #[must_use]
    pub fn with_records(self, resource: ResourceKind, rows: Vec<Value>) -> Self {
        lock(&self.data).insert(resource, rows);
        self
    }

    /// Delays every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next call fail with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, error: FetchError) {
        lock(&self.failures).push_back(error);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<FixtureCall> {
        lock(&self.calls).clone()
    }

    /// File deletions received so far, in arrival order.
    #[must_use]
    pub fn deleted_files(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                FixtureCall::DeleteFile { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// List requests received so far.
    #[must_use]
    pub fn list_calls(&self) -> Vec<QueryKey> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                FixtureCall::List(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    async fn begin(&self, call: FixtureCall) -> std::result::Result<(), FetchError> {
        lock(&self.calls).push(call);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match lock(&self.failures).pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn field_text(row: &Value, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl Backend for FixtureBackend {
    async fn fetch_list(&self, key: &QueryKey) -> std::result::Result<RemoteListResult<Record>, FetchError> {
        self.begin(FixtureCall::List(key.clone())).await?;

        let rows = lock(&self.data).get(&key.resource).cloned().unwrap_or_default();
        let mut records = rows
            .into_iter()
            .filter(|row| {
                key.params
                    .iter()
                    .filter(|(name, _)| !RESERVED_PARAMS.contains(&name.as_str()))
                    .all(|(name, value)| field_text(row, name).as_deref() == Some(value.as_str()))
            })
            .map(|row| key.resource.decode(row))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if let Some(term) = key.param("search") {
            let term = term.to_lowercase();
            records.retain(|record| record.display_name().to_lowercase().contains(&term));
        }

        let order: SortOrder = key.param("sortOrder").and_then(|s| s.parse().ok()).unwrap_or_default();
        if order == SortOrder::Desc {
            records.reverse();
        }

        let page = key.page().max(1);
        let limit: u32 = key.param("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
        let total = records.len() as u64;
        let start = usize::try_from(u64::from(page - 1) * u64::from(limit)).unwrap_or(usize::MAX);

        let list = records
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();

        Ok(RemoteListResult::new(list, page, limit, total))
    }

    async fn update_status(
        &self,
        resource: ResourceKind,
        change: &StatusChange,
    ) -> std::result::Result<(), FetchError> {
        self.begin(FixtureCall::UpdateStatus {
            resource,
            change: change.clone(),
        })
        .await?;

        let mut data = lock(&self.data);
        let row = data
            .get_mut(&resource)
            .and_then(|rows| rows.iter_mut().find(|row| field_text(row, "id").as_deref() == Some(change.id.as_str())))
            .ok_or_else(|| FetchError::NotFound(format!("{} {}", resource.title(), change.id)))?;

        if let Value::Object(fields) = row {
            fields.insert("approvalStatus".to_string(), Value::String(change.approval_status.to_string()));
            if let Some(reason) = &change.rejection_reason {
                fields.insert("rejectionReason".to_string(), Value::String(reason.clone()));
            }
        }
        Ok(())
    }

    async fn delete_record(&self, resource: ResourceKind, id: &str) -> std::result::Result<(), FetchError> {
        self.begin(FixtureCall::Delete {
            resource,
            id: id.to_string(),
        })
        .await?;

        let mut data = lock(&self.data);
        let rows = data.entry(resource).or_default();
        let before = rows.len();
        rows.retain(|row| field_text(row, "id").as_deref() != Some(id));
        if rows.len() == before {
            return Err(FetchError::NotFound(format!("{} {id}", resource.title())));
        }
        Ok(())
    }

    async fn upload_file(&self, field: &str, path: &Path) -> std::result::Result<UploadedFile, FetchError> {
        self.begin(FixtureCall::Upload {
            field: field.to_string(),
        })
        .await?;

        let name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        Ok(UploadedFile {
            url: format!("fixture://uploads/{field}/{name}"),
        })
    }

    async fn delete_file(&self, url: &str) -> std::result::Result<(), FetchError> {
        self.begin(FixtureCall::DeleteFile { url: url.to_string() }).await
    }
}
