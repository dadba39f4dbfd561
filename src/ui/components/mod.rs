//! Composable UI component renderers.
//!
//! Each component appends its part of the screen to a `String` buffer.
//!
//! # Components
//!
//! - `header`: Title, address line, status tabs and result summary
//! - `search`: Search input box
//! - `table`: Column headers with rows, skeleton rows, or the empty/error state
//! - `empty`: Empty and error state messages
//! - `footer`: Pagination strip, notifications and keybinding hints
//! - `modal`: Status-change and delete-confirmation dialogs
//!
//! # Layout
//!
//! ```text
//! [Header]
//! [Border]
//! [Search Bar - 3 lines]
//! [Table Headers]
//! [Table Rows | Skeleton | Empty | Error]
//! [Border]
//! [Pagination]
//! [Dialog]
//! [Toasts]
//! [Keybindings]
//! ```

mod empty;
mod footer;
mod header;
mod modal;
mod search;
mod table;

use std::fmt::{Result, Write};

use crate::ui::theme::Theme;
use crate::ui::viewmodel::ListingViewModel;

use footer::{render_footer, render_pagination};
use header::render_header;
use modal::render_modal;
use search::render_search_bar;
use table::render_table;

/// Appends a horizontal separator line.
fn render_border(out: &mut String, color: &str, cols: usize) -> Result {
    writeln!(out, "{}{}{}", Theme::fg(color), "─".repeat(cols), Theme::reset())
}

/// Renders the full listing screen layout.
pub fn render_listing(out: &mut String, vm: &ListingViewModel, theme: &Theme, cols: usize) -> Result {
    render_header(out, &vm.header, theme, cols)?;
    render_border(out, &theme.colors.border, cols)?;
    render_search_bar(out, &vm.search_bar, theme, cols)?;
    render_table(out, &vm.columns, &vm.body, theme, cols)?;

    if let Some(error) = &vm.stale_error {
        writeln!(out, "{}⚠ {error}{}", Theme::fg(&theme.colors.error_fg), Theme::reset())?;
    }

    render_border(out, &theme.colors.border, cols)?;
    if let Some(pagination) = &vm.pagination {
        render_pagination(out, pagination, theme)?;
    }
    if let Some(modal) = &vm.modal {
        render_modal(out, modal, theme, cols)?;
    }
    render_footer(out, &vm.footer, theme, cols)
}
