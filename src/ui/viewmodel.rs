//! View model types representing renderable UI state.
//!
//! This module defines immutable view models computed from listing state,
//! following the MVVM pattern. View models are optimized for rendering and
//! contain pre-computed display information like cell text, highlight ranges
//! and pagination items.
//!
//! # Architecture
//!
//! View models are created via `ListingState::compute_viewmodel()` and consumed
//! by the renderer. They contain no business logic, only display-ready data.
//!
//! # Example
//!
//! ```rust
//! use rentadmin::ui::viewmodel::{EmptyState, TableBody};
//!
//! let body = TableBody::Empty(EmptyState {
//!     message: "No vehicles found for 'toyota'".to_string(),
//!     subtitle: "Try a different search term".to_string(),
//! });
//! assert!(!body.is_loading());
//! ```

use crate::app::modes::Toast;
use crate::app::options::SelectOption;
use crate::domain::{ApprovalStatus, ColumnHeader};
use crate::ui::pagination::PaginationModel;

/// Complete view model of one listing screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingViewModel {
    pub header: HeaderInfo,

    pub search_bar: SearchBarInfo,

    /// Column headers of the table, in display order.
    pub columns: Vec<ColumnHeader>,

    /// Exactly one of loading, empty, error or rows.
    pub body: TableBody,

    /// `None` when everything fits on one page.
    pub pagination: Option<PaginationModel>,

    /// Error from a refetch while older rows stay on screen.
    pub stale_error: Option<String>,

    pub footer: FooterInfo,

    pub modal: Option<ModalView>,
}

/// Title bar information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Resource title (e.g., "Vehicles").
    pub title: String,

    /// Address bar text: path plus query string.
    pub location: String,

    /// Status tabs, empty for single-tab screens.
    pub tabs: Vec<TabInfo>,

    /// Result summary (e.g., "47 vehicles, page 3 of 3").
    pub summary: Option<String>,

    /// A request is running in the background.
    pub is_fetching: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub name: &'static str,
    pub is_active: bool,
}

/// Search input box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarInfo {
    /// Text currently typed, committed or not.
    pub query: String,

    /// Keystrokes go to the search input.
    pub is_focused: bool,

    /// The typed text has not been committed yet.
    pub is_pending: bool,
}

/// Content of the table slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    /// Placeholder rows shown while the first page of a key loads.
    Loading { skeleton_rows: usize },

    Empty(EmptyState),

    /// The request failed and there is nothing to show.
    Error { message: String, retry_hint: String },

    Rows(Vec<DisplayRow>),
}

impl TableBody {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    #[must_use]
    pub const fn is_empty_state(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

/// Empty state message display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    /// Primary message (e.g., "No vehicles found").
    pub message: String,

    /// Secondary explanatory text.
    pub subtitle: String,
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    /// One-based row number used by row-action commands.
    pub number: usize,

    /// Cell text, one per column.
    pub cells: Vec<String>,

    /// Byte ranges to highlight in the searchable column.
    pub highlight_ranges: Vec<(usize, usize)>,

    /// Drives the status cell color.
    pub status: Option<ApprovalStatus>,

    /// The row is the target of the open dialog.
    pub is_selected: bool,
}

/// Footer with keybinding hints and notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    pub keybindings: String,

    /// Most recent notifications, oldest first.
    pub toasts: Vec<Toast>,
}

/// Open dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalView {
    pub title: String,

    /// Body text, one entry per line.
    pub lines: Vec<String>,

    /// Choices offered by a select input.
    pub options: Vec<SelectOption>,

    /// Inline validation error.
    pub error: Option<String>,

    /// Command hint shown at the bottom of the dialog.
    pub hint: String,
}
