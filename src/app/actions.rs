//! Actions representing side effects to be executed by the console runtime.
//!
//! The event handler returns a `Vec<Action>` after processing each event,
//! allowing several side effects to be queued atomically. The runtime executes
//! them in order.
//!
//! # Example
//!
//! ```rust
//! use rentadmin::app::Action;
//! use rentadmin::domain::ResourceKind;
//! use rentadmin::worker::WorkerMessage;
//!
//! let actions = vec![
//!     Action::PostToWorker(WorkerMessage::invalidate(ResourceKind::Vehicles)),
//!     Action::ReplaceUrl("/vehicles?tab=all".to_string()),
//! ];
//! assert_eq!(actions.len(), 2);
//! ```

use crate::worker::WorkerMessage;

/// Commands representing side effects to be executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Posts a message to the background worker.
    PostToWorker(WorkerMessage),

    /// Rewrites the current URL without adding a history entry.
    ///
    /// Emitted when the search term is committed or cleared and when an
    /// invalid tab is redirected to the default one.
    ReplaceUrl(String),

    /// Leaves the listing for another screen (e.g., an edit form).
    Navigate(String),

    /// Stops the console.
    Quit,
}
