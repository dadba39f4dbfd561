//! Per-screen view of the list cache.

use crate::fetch::cache::ListData;
use crate::fetch::{FetchError, QueryKey};

/// What a screen shows while a new key is loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placeholder {
    /// Keep showing the previous key's rows until the new ones arrive.
    #[default]
    KeepPrevious,
    /// Clear the rows and show the loading state.
    Loading,
}

/// Snapshot consumed by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStatus {
    pub data: Option<ListData>,
    /// No data to show yet and a request is running.
    pub is_loading: bool,
    /// A request is running, with or without data on screen.
    pub is_fetching: bool,
    pub is_error: bool,
    pub error: Option<FetchError>,
    /// `data` belongs to a previous key.
    pub is_placeholder: bool,
}

/// Identifies one request issued by an observer. Later requests compare greater.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Tracks the current key of one screen and the responses addressed to it.
///
/// Responses are matched by key and by request: anything that arrives for a
/// key the screen has moved away from, or that answers a request older than
/// the latest one issued, is dropped.
#[derive(Debug, Clone, Default)]
pub struct QueryObserver {
    placeholder: Placeholder,
    current: Option<QueryKey>,
    latest: RequestId,
    data: Option<ListData>,
    data_key: Option<QueryKey>,
    fetching: bool,
    error: Option<FetchError>,
}

impl QueryObserver {
    #[must_use]
    pub fn new(placeholder: Placeholder) -> Self {
        Self {
            placeholder,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_current(&self, key: &QueryKey) -> bool {
        self.current.as_ref() == Some(key)
    }

    /// Starts observing `key`. `cached` is whatever the cache holds for it.
    ///
    /// Re-observing the current key is a background refetch: data on screen
    /// stays and no loading state is shown. Only the response to the returned
    /// request will be applied.
    pub fn begin(&mut self, key: QueryKey, cached: Option<ListData>) -> RequestId {
        self.latest = RequestId(self.latest.0 + 1);
        if self.is_current(&key) {
            if let Some(cached) = cached {
                self.data = Some(cached);
                self.data_key = Some(key);
            }
            self.fetching = true;
            return self.latest;
        }

        tracing::debug!(key = %key, placeholder = ?self.placeholder, "observing new key");
        self.error = None;
        self.fetching = true;
        match cached {
            Some(cached) => {
                self.data = Some(cached);
                self.data_key = Some(key.clone());
            }
            None if self.placeholder == Placeholder::Loading => {
                self.data = None;
                self.data_key = None;
            }
            None => {}
        }
        self.current = Some(key);
        self.latest
    }

    /// Stops observing. The screen is idle until the next [`begin`](Self::begin).
    pub fn disable(&mut self) {
        self.current = None;
        self.data = None;
        self.data_key = None;
        self.fetching = false;
        self.error = None;
    }

    /// Applies a response. Returns `false` when it was discarded as stale.
    pub fn complete(&mut self, key: &QueryKey, request: RequestId, result: Result<ListData, FetchError>) -> bool {
        if !self.is_current(key) {
            tracing::debug!(key = %key, "discarding response for stale key");
            return false;
        }
        if request != self.latest {
            tracing::debug!(key = %key, request = request.0, latest = self.latest.0, "discarding superseded response");
            return false;
        }

        self.fetching = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.data_key = Some(key.clone());
                self.error = None;
            }
            Err(error) => {
                tracing::debug!(key = %key, error = %error, "list fetch failed");
                self.error = Some(error);
            }
        }
        true
    }

    #[must_use]
    pub fn status(&self) -> QueryStatus {
        if self.current.is_none() {
            return QueryStatus::default();
        }

        QueryStatus {
            data: self.data.clone(),
            is_loading: self.data.is_none() && self.fetching,
            is_fetching: self.fetching,
            is_error: self.error.is_some(),
            error: self.error.clone(),
            is_placeholder: self.data.is_some() && self.data_key != self.current,
        }
    }
}
