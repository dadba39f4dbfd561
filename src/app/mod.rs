//! Application layer coordinating listing state, events, and actions.
//!
//! This module sits between the console runtime (main.rs) and the
//! domain/fetch/storage/worker layers. It owns everything a listing screen
//! remembers between events.
//!
//! # Architecture
//!
//! The application layer follows a unidirectional data flow pattern:
//!
//! ```text
//! Commands → Events → Event Handler → State Mutations → Actions → Side Effects
//!                          ↑                                 ↓
//!                          └─────── Worker Responses ────────┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands emitted by the event handler
//! - [`debounce`]: Cancellable delayed commits of the search input
//! - [`handler`]: Event processing and state transitions
//! - [`location`]: URL path and query parameters of the current screen
//! - [`modes`]: Input mode, dialogs and toasts
//! - [`options`]: Local filtering of dropdown options
//! - [`state`]: Listing state container and view model computation
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use rentadmin::app::location::Location;
//! use rentadmin::app::{handle_event, Action, Event, ListingOptions, ListingState};
//! use rentadmin::domain::ResourceKind;
//! use rentadmin::fetch::{FixtureBackend, QueryClient, RetryPolicy};
//! use rentadmin::storage::Selection;
//! use rentadmin::ui::Theme;
//!
//! let client = QueryClient::new(Arc::new(FixtureBackend::new()), Duration::from_secs(30), RetryPolicy::none());
//! let mut state = ListingState::new(
//!     ResourceKind::Brands,
//!     Location::parse("/brands")?,
//!     &Selection::default(),
//!     client,
//!     ListingOptions::default(),
//!     Theme::default(),
//! );
//! let (_, actions) = handle_event(&mut state, &Event::Mount)?;
//! assert!(matches!(actions[0], Action::PostToWorker(_)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod actions;
pub mod debounce;
pub mod handler;
pub mod location;
pub mod modes;
pub mod options;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use modes::{InputMode, ModalState, RowAction, Toast, ToastKind};
pub use state::{ListingOptions, ListingState};
