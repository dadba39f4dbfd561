//! Process-wide list cache with request coalescing.
//!
//! [`QueryClient`] keeps the last result per [`QueryKey`] together with at
//! most one in-flight request per key. Concurrent callers asking for the same
//! key share that request. A result younger than `stale_time` is served
//! without touching the backend.
//!
//! Invalidation marks every entry of a resource stale and forgets its
//! in-flight request, so the next fetch always goes to the network. The
//! forgotten request still completes for whoever awaits it, but its result is
//! no longer written to the cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backon::Retryable;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::Instrument;

use crate::domain::{Record, RemoteListResult, ResourceKind};
use crate::fetch::backend::Backend;
use crate::fetch::retry::RetryPolicy;
use crate::fetch::{FetchError, QueryKey};

/// Shared, immutable list result handed to the view.
pub type ListData = Arc<RemoteListResult<Record>>;

type SharedFetch = Shared<BoxFuture<'static, Result<ListData, FetchError>>>;

#[derive(Default)]
struct CacheEntry {
    data: Option<ListData>,
    updated_at: Option<Instant>,
    in_flight: Option<(u64, SharedFetch)>,
}

struct Inner {
    backend: Arc<dyn Backend>,
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    stale_time: Duration,
    retry: RetryPolicy,
    next_request: AtomicU64,
}

/// Cheaply cloneable handle to the shared cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("stale_time", &self.inner.stale_time)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, stale_time: Duration, retry: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                entries: Mutex::new(HashMap::new()),
                stale_time,
                retry,
                next_request: AtomicU64::new(1),
            }),
        }
    }

    #[must_use]
    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.inner.backend)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.inner.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached data for `key`, fresh or not.
    #[must_use]
    pub fn peek(&self, key: &QueryKey) -> Option<ListData> {
        self.entries().get(key).and_then(|entry| entry.data.clone())
    }

    #[must_use]
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries()
            .get(key)
            .and_then(|entry| entry.updated_at)
            .is_some_and(|at| at.elapsed() < self.inner.stale_time)
    }

    #[must_use]
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries().get(key).is_some_and(|entry| entry.in_flight.is_some())
    }

    /// Returns data for `key`, from cache when fresh, otherwise from the
    /// backend (joining an in-flight request for the same key if any).
    ///
    /// # Errors
    ///
    /// Returns the backend error after retries are exhausted.
    pub async fn fetch(&self, key: QueryKey) -> Result<ListData, FetchError> {
        let span = tracing::debug_span!("query_fetch", key = %key, force = false);
        self.fetch_inner(key, false).instrument(span).await
    }

    /// Like [`fetch`](Self::fetch) but ignores freshness.
    ///
    /// # Errors
    ///
    /// Returns the backend error after retries are exhausted.
    pub async fn refetch(&self, key: QueryKey) -> Result<ListData, FetchError> {
        let span = tracing::debug_span!("query_fetch", key = %key, force = true);
        self.fetch_inner(key, true).instrument(span).await
    }

    async fn fetch_inner(&self, key: QueryKey, force: bool) -> Result<ListData, FetchError> {
        let (request_id, request) = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_default();

            if !force {
                if let (Some(data), Some(at)) = (&entry.data, entry.updated_at) {
                    if at.elapsed() < self.inner.stale_time {
                        tracing::debug!("serving fresh cache entry");
                        return Ok(Arc::clone(data));
                    }
                }
            }

            if let Some((id, request)) = &entry.in_flight {
                tracing::debug!(request_id = id, "joining in-flight request");
                (*id, request.clone())
            } else {
                let id = self.inner.next_request.fetch_add(1, Ordering::Relaxed);
                let request = request_list(Arc::clone(&self.inner.backend), key.clone(), self.inner.retry)
                    .boxed()
                    .shared();
                entry.in_flight = Some((id, request.clone()));
                tracing::debug!(request_id = id, "starting request");
                (id, request)
            }
        };

        let result = request.await;

        let mut entries = self.entries();
        if let Some(entry) = entries.get_mut(&key) {
            if entry.in_flight.as_ref().is_some_and(|(id, _)| *id == request_id) {
                entry.in_flight = None;
                if let Ok(data) = &result {
                    entry.data = Some(Arc::clone(data));
                    entry.updated_at = Some(Instant::now());
                }
            }
        }

        result
    }

    /// Marks every entry of `resource` stale and drops its in-flight request.
    ///
    /// Returns the number of entries touched. Never waits on the network.
    pub fn invalidate(&self, resource: ResourceKind) -> usize {
        let mut entries = self.entries();
        let mut touched = 0;
        for (key, entry) in entries.iter_mut() {
            if key.resource == resource {
                entry.updated_at = None;
                entry.in_flight = None;
                touched += 1;
            }
        }
        tracing::debug!(resource = %resource, entries = touched, "cache invalidated");
        touched
    }
}

async fn request_list(
    backend: Arc<dyn Backend>,
    key: QueryKey,
    policy: RetryPolicy,
) -> Result<ListData, FetchError> {
    (|| async { backend.fetch_list(&key).await })
        .retry(policy.backoff())
        .when(FetchError::should_retry)
        .notify(|e, dur| {
            tracing::warn!(
                key = %key,
                "list fetch failed, retrying after {:.2}s: {}",
                dur.as_secs_f64(),
                e
            );
        })
        .await
        .map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListingQuery;
    use crate::fetch::fixture::FixtureBackend;
    use serde_json::json;

    fn setup(latency: Duration) -> (Arc<FixtureBackend>, QueryClient) {
        let rows = (1..=12).map(|i| json!({"id": format!("c-{i}"), "name": format!("Category {i}")})).collect();
        let backend = Arc::new(
            FixtureBackend::new()
                .with_records(ResourceKind::Categories, rows)
                .with_latency(latency),
        );
        let client = QueryClient::new(backend.clone(), Duration::from_secs(30), RetryPolicy::default());
        (backend, client)
    }

    fn key(page: u32) -> QueryKey {
        QueryKey::new(ResourceKind::Categories, &ListingQuery { page, ..ListingQuery::default() })
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_keys_share_one_request() {
        let (backend, client) = setup(Duration::from_millis(100));

        let (a, b) = tokio::join!(client.fetch(key(1)), client.fetch(key(1)));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(backend.list_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_entries_skip_the_backend() {
        let (backend, client) = setup(Duration::ZERO);

        client.fetch(key(1)).await.unwrap();
        client.fetch(key(1)).await.unwrap();
        assert_eq!(backend.list_calls().len(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        client.fetch(key(1)).await.unwrap();
        assert_eq!(backend.list_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_forces_a_new_request() {
        let (backend, client) = setup(Duration::ZERO);

        client.fetch(key(1)).await.unwrap();
        client.fetch(key(2)).await.unwrap();
        assert_eq!(client.invalidate(ResourceKind::Categories), 2);
        assert_eq!(client.invalidate(ResourceKind::Brands), 0);

        assert!(client.peek(&key(1)).is_some());
        assert!(!client.is_fresh(&key(1)));
        client.fetch(key(1)).await.unwrap();
        assert_eq!(backend.list_calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let (backend, client) = setup(Duration::ZERO);
        backend.fail_next(FetchError::Http { status: 502, body: String::new() });

        let data = client.fetch(key(1)).await.unwrap();
        assert_eq!(data.list.len(), 10);
        assert_eq!(backend.list_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts() {
        let (backend, client) = setup(Duration::ZERO);
        for _ in 0..3 {
            backend.fail_next(FetchError::Timeout);
        }

        assert_eq!(client.fetch(key(1)).await.unwrap_err(), FetchError::Timeout);
        assert_eq!(backend.list_calls().len(), 3);
        assert!(client.peek(&key(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let (backend, client) = setup(Duration::ZERO);
        backend.fail_next(FetchError::Http { status: 400, body: "bad".to_string() });

        assert!(client.fetch(key(1)).await.is_err());
        assert_eq!(backend.list_calls().len(), 1);
    }
}
