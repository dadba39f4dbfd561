//! rentadmin: listing screens of a vehicle-rental marketplace admin dashboard.
//!
//! The crate provides:
//! - A listing-state coordinator keeping pagination, sort, search and filters
//!   in sync with the screen URL
//! - A keyed fetch cache with request coalescing, stale-while-revalidate and
//!   last-key-wins result handling
//! - A presentation table with loading, empty, error and pagination states
//! - Approval workflow rules, persisted region selection and upload tracking

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Console runtime (main.rs)                          │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← State machine
//! │  - Event handling                                   │
//! │  - URL sync and search debounce                     │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Fetch Layer   │   │ Worker Layer  │
//! │ (ui/)         │   │ (fetch/)      │   │ (worker/)     │
//! │ - Rendering   │   │ - Query cache │   │ - Async tasks │
//! │ - Theming     │   │ - HTTP/fixture│   │ - Timers      │
//! │ - Pagination  │   │ - Retry       │   │ - Mutations   │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain, Storage & Infrastructure                   │
//! │  - Resources, approval rules (domain/)              │
//! │  - Selection and upload store (storage/)            │
//! │  - Platform paths (infrastructure/)                 │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - Log file and JSON-lines span export              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Listing state machine with event/action model
//! - [`domain`]: Resources, listing query, approval rules, errors
//! - [`fetch`]: Backend trait, HTTP client and the list cache
//! - [`infrastructure`]: Platform paths
//! - [`storage`]: Persisted region selection and upload records
//! - [`worker`]: Background tasks for fetches, mutations and timers
//! - [`ui`]: Terminal rendering with theme support
//! - [`observability`]: Tracing subscriber and span export
//!
//! # Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://api.example.com/admin"
//! timeout_ms = 30000
//!
//! [listing]
//! resource = "vehicles"
//! limit = 20
//! sort_order = "DESC"
//! placeholder = "keep-previous"
//! debounce_ms = 500
//!
//! [cache]
//! stale_time_ms = 30000
//!
//! [retry]
//! max_attempts = 3
//!
//! [ui]
//! theme = "catppuccin-latte"
//!
//! [observability]
//! trace_level = "debug"
//! ```
//!
//! The API token is read from `RENTADMIN_API_TOKEN`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rentadmin::app::location::Location;
//! use rentadmin::fetch::{FixtureBackend, QueryClient};
//! use rentadmin::storage::Selection;
//! use rentadmin::{handle_event, initialize, Config, Event, ResourceKind};
//!
//! let config = Config::default();
//! let client = QueryClient::new(Arc::new(FixtureBackend::new()), config.stale_time(), config.retry);
//! let mut state = initialize(
//!     &config,
//!     ResourceKind::Companies,
//!     Location::parse("/companies")?,
//!     &Selection::default(),
//!     client,
//! );
//!
//! let (_, actions) = handle_event(&mut state, &Event::Mount)?;
//! assert!(!actions.is_empty());
//! # Ok::<(), rentadmin::RentAdminError>(())
//! ```

pub mod app;
pub mod domain;
pub mod fetch;
pub mod infrastructure;
pub mod observability;
pub mod storage;
pub mod ui;
pub mod worker;

pub use app::{handle_event, Action, Event, InputMode, ListingOptions, ListingState};
pub use domain::{Record, RentAdminError, ResourceKind, Result};
pub use ui::Theme;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use app::location::Location;
use domain::{PageLimit, SortOrder};
use fetch::{ApiClient, Backend, FixtureBackend, Placeholder, QueryClient, RetryPolicy};
use storage::Selection;

/// Environment variable holding the API bearer token.
pub const TOKEN_ENV: &str = "RENTADMIN_API_TOKEN";

/// Console configuration, read from TOML.
///
/// Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub listing: ListingConfig,
    pub cache: CacheConfig,
    pub retry: RetryPolicy,
    pub ui: UiConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the admin REST API, e.g. `https://api.example.com/admin`.
    pub base_url: Option<String>,
    /// Bearer token. Usually supplied through `RENTADMIN_API_TOKEN` instead.
    pub token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Screen opened when `--resource` is not given.
    pub resource: Option<String>,
    pub limit: PageLimit,
    pub sort_order: SortOrder,
    pub placeholder: Placeholder,
    pub debounce_ms: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            resource: None,
            limit: PageLimit::default(),
            sort_order: SortOrder::default(),
            placeholder: Placeholder::default(),
            debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached page is served without revalidation.
    pub stale_time_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_time_ms: 30_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Built-in theme name. Ignored if `theme_file` is set.
    pub theme: Option<String>,
    /// Path to a custom TOML theme file. See [`ui::theme`] for the format.
    pub theme_file: Option<String>,
    /// Render width in columns.
    pub columns: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: None,
            theme_file: None,
            columns: 120,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
    /// Directory for the log and span files.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`RentAdminError::Config`] when the TOML is malformed or a value
    /// has the wrong type (e.g. `limit = 25`).
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| RentAdminError::Config(e.to_string()))
    }

    /// Loads the configuration file at `path`, or the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// explicit file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = path.map_or_else(
            || (infrastructure::config_file(), false),
            |path| (path.to_path_buf(), true),
        );

        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| RentAdminError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Applies flat `section.key = value` overrides on top of the file values.
    ///
    /// # Parsing Rules
    ///
    /// - `api.base_url`, `api.token`, `listing.resource`, `ui.theme`,
    ///   `ui.theme_file`, `observability.trace_level`: taken as-is
    /// - `api.timeout_ms`, `listing.debounce_ms`, `cache.stale_time_ms`,
    ///   `ui.columns`: unsigned integers
    /// - `listing.limit`: one of 10/15/20/30
    /// - `listing.sort_order`: `asc` or `desc`
    ///
    /// # Errors
    ///
    /// Returns [`RentAdminError::Config`] for unknown keys or unparsable values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use rentadmin::Config;
    ///
    /// let mut overrides = BTreeMap::new();
    /// overrides.insert("listing.limit".to_string(), "20".to_string());
    /// overrides.insert("ui.theme".to_string(), "catppuccin-latte".to_string());
    ///
    /// let mut config = Config::default();
    /// config.apply_overrides(&overrides)?;
    /// assert_eq!(config.listing.limit.value(), 20);
    /// # Ok::<(), rentadmin::RentAdminError>(())
    /// ```
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in overrides {
            let value = value.trim();
            match key.as_str() {
                "api.base_url" => self.api.base_url = Some(value.to_string()),
                "api.token" => self.api.token = Some(value.to_string()),
                "api.timeout_ms" => self.api.timeout_ms = parse_number(key, value)?,
                "listing.resource" => self.listing.resource = Some(value.to_string()),
                "listing.limit" => {
                    self.listing.limit = PageLimit::try_from(parse_number::<u32>(key, value)?)
                        .map_err(|e| RentAdminError::Config(e.to_string()))?;
                }
                "listing.sort_order" => {
                    self.listing.sort_order =
                        value.parse().map_err(|e: RentAdminError| RentAdminError::Config(e.to_string()))?;
                }
                "listing.debounce_ms" => self.listing.debounce_ms = parse_number(key, value)?,
                "cache.stale_time_ms" => self.cache.stale_time_ms = parse_number(key, value)?,
                "ui.theme" => self.ui.theme = Some(value.to_string()),
                "ui.theme_file" => self.ui.theme_file = Some(value.to_string()),
                "ui.columns" => self.ui.columns = parse_number(key, value)?,
                "observability.trace_level" => self.observability.trace_level = Some(value.to_string()),
                other => return Err(RentAdminError::Config(format!("unknown setting '{other}'"))),
            }
        }
        Ok(())
    }

    /// Takes the API token from the environment when it is set.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.api.token = Some(token);
            }
        }
    }

    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        Duration::from_millis(self.cache.stale_time_ms)
    }

    #[must_use]
    pub const fn listing_options(&self) -> ListingOptions {
        ListingOptions {
            placeholder: self.listing.placeholder,
            debounce: Duration::from_millis(self.listing.debounce_ms),
            limit: self.listing.limit,
            sort_order: self.listing.sort_order,
        }
    }

    /// Builds the backend: fixtures when a file is given, HTTP otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RentAdminError::Config`] when neither fixtures nor a valid
    /// `api.base_url` are available, and fixture loading errors as-is.
    pub fn backend(&self, fixtures: Option<&Path>) -> Result<Arc<dyn Backend>> {
        if let Some(path) = fixtures {
            return Ok(Arc::new(FixtureBackend::from_file(path)?));
        }

        let base_url = self
            .api
            .base_url
            .as_deref()
            .ok_or_else(|| RentAdminError::Config("api.base_url is not set (or pass --fixtures)".to_string()))?;
        let base_url = Url::parse(base_url).map_err(|e| RentAdminError::Config(format!("api.base_url: {e}")))?;
        let client = ApiClient::new(base_url, self.api.token.clone(), Duration::from_millis(self.api.timeout_ms))?;
        Ok(Arc::new(client))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RentAdminError::Config(format!("{key}: {e}")))
}

/// Resolves the theme: file first, then built-in name, then the default.
///
/// Failures are logged and fall back to the default theme.
#[must_use]
pub fn load_theme(config: &UiConfig) -> Theme {
    config.theme_file.as_ref().map_or_else(
        || {
            config.theme.as_ref().map_or_else(Theme::default, |theme_name| {
                Theme::from_name(theme_name).unwrap_or_else(|| {
                    tracing::warn!(theme_name = %theme_name, "unknown theme, using default");
                    Theme::default()
                })
            })
        },
        |theme_file| {
            Theme::from_file(infrastructure::expand_tilde(theme_file)).unwrap_or_else(|e| {
                tracing::warn!(theme_file = %theme_file, error = %e, "failed to load theme from file, using default");
                Theme::default()
            })
        },
    )
}

/// Creates the listing state of one screen.
#[must_use]
pub fn initialize(
    config: &Config,
    resource: ResourceKind,
    location: Location,
    selection: &Selection,
    client: QueryClient,
) -> ListingState {
    tracing::debug!(resource = %resource, url = %location.path_and_query(), "initializing listing");
    let theme = load_theme(&config.ui);
    ListingState::new(resource, location, selection, client, config.listing_options(), theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_default_individually() {
        let config = Config::from_toml(
            r#"
            [listing]
            limit = 30
            sort_order = "ASC"

            [retry]
            max_attempts = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.listing.limit, PageLimit::Thirty);
        assert_eq!(config.listing.sort_order, SortOrder::Asc);
        assert_eq!(config.listing.debounce_ms, 500);
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.stale_time(), Duration::from_secs(30));
        assert_eq!(config.ui.columns, 120);
    }

    #[test]
    fn unsupported_page_sizes_are_rejected() {
        assert!(Config::from_toml("[listing]\nlimit = 25").is_err());

        let mut overrides = BTreeMap::new();
        overrides.insert("listing.limit".to_string(), "25".to_string());
        assert!(Config::default().apply_overrides(&overrides).is_err());
    }

    #[test]
    fn unknown_override_keys_are_errors() {
        let mut overrides = BTreeMap::new();
        overrides.insert("listing.pagesize".to_string(), "20".to_string());
        let err = Config::default().apply_overrides(&overrides).unwrap_err();
        assert!(err.to_string().contains("listing.pagesize"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn backend_requires_a_base_url_or_fixtures() {
        let config = Config::default();
        assert!(matches!(config.backend(None), Err(RentAdminError::Config(_))));

        let mut config = Config::default();
        config.api.base_url = Some("https://api.example.com/admin".to_string());
        assert!(config.backend(None).is_ok());
    }

    #[test]
    fn unknown_theme_names_fall_back_to_default() {
        let ui = UiConfig {
            theme: Some("solarized".to_string()),
            ..UiConfig::default()
        };
        assert_eq!(load_theme(&ui), Theme::default());
    }
}
