//! Remote list fetching: transport, retries, caching and per-screen observation.
//!
//! # Modules
//!
//! - [`backend`]: The [`Backend`] trait implemented by every transport
//! - [`api`]: reqwest client for the dashboard REST API
//! - [`fixture`]: Offline in-memory backend
//! - [`cache`]: [`QueryClient`], the shared coalescing cache
//! - [`observer`]: [`QueryObserver`], last-key-wins view state of one screen
//! - [`retry`]: Backoff policy for transient failures

pub mod api;
pub mod backend;
pub mod cache;
pub mod error;
pub mod fixture;
pub mod key;
pub mod observer;
pub mod retry;

pub use api::ApiClient;
pub use backend::{Backend, UploadedFile};
pub use cache::{ListData, QueryClient};
pub use error::FetchError;
pub use fixture::{FixtureBackend, FixtureCall};
pub use key::QueryKey;
pub use observer::{Placeholder, QueryObserver, QueryStatus, RequestId};
pub use retry::RetryPolicy;
