//! Empty and error state renderers for the table slot.

use std::fmt::{Result, Write};

use crate::ui::helpers::{truncate, visible_width};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::EmptyState;

fn write_centered(out: &mut String, text: &str, style: &str, cols: usize) -> Result {
    let text = truncate(text, cols);
    let len = visible_width(&text);
    let padding = cols.saturating_sub(len) / 2;
    writeln!(
        out,
        "{style}{}{text}{}{}",
        " ".repeat(padding),
        " ".repeat(cols.saturating_sub(padding + len)),
        Theme::reset()
    )
}

/// Renders the "nothing found" message in place of the table rows.
pub fn render_empty_state(out: &mut String, empty: &EmptyState, theme: &Theme, cols: usize) -> Result {
    out.push('\n');
    write_centered(out, &empty.message, &Theme::fg(&theme.colors.empty_state_fg), cols)?;
    write_centered(
        out,
        &empty.subtitle,
        &format!("{}{}", Theme::dim(), Theme::fg(&theme.colors.text_dim)),
        cols,
    )
}

/// Renders a failed request in place of the table rows.
pub fn render_error_state(out: &mut String, message: &str, retry_hint: &str, theme: &Theme, cols: usize) -> Result {
    out.push('\n');
    write_centered(
        out,
        message,
        &format!("{}{}", Theme::bold(), Theme::fg(&theme.colors.error_fg)),
        cols,
    )?;
    write_centered(out, retry_hint, &Theme::fg(&theme.colors.text_dim), cols)
}
