//! Interaction state types for a listing screen.
//!
//! # State Machine
//!
//! - **Input**: `Normal` (commands) or `Search` (keystrokes edit the search input)
//! - **Modal**: closed, a status-change dialog, or a delete confirmation
//!
//! A modal always targets the record stored as the screen's selected entity.

use chrono::{DateTime, Utc};

use crate::app::options::SelectOption;
use crate::domain::{ApprovalStatus, ReviewFlow};

/// Current input handling mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Keystrokes go to the search input.
    Search,
}

/// Actions offered on every table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
    ChangeStatus,
}

/// Open dialog, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    StatusChange {
        current: ApprovalStatus,
        flow: ReviewFlow,
        /// Inline validation message shown inside the dialog.
        error: Option<String>,
    },
    ConfirmDelete,
}

impl ModalState {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Statuses the status dialog offers for the given flow.
    #[must_use]
    pub fn status_options(flow: ReviewFlow) -> Vec<SelectOption> {
        ApprovalStatus::ALL
            .into_iter()
            .filter(|status| *status != ApprovalStatus::Pending)
            .filter(|status| flow == ReviewFlow::Modification || *status != ApprovalStatus::UnderReview)
            .map(|status| SelectOption::new(status.as_str(), status.as_str().replace('_', " ")))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Destructive,
}

/// A transient notification shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn destructive(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Destructive,
            message: message.into(),
            at: Utc::now(),
        }
    }
}
