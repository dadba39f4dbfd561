//! Header component renderer.
//!
//! Renders the centered resource title, the address line, the status tabs and
//! the result summary.

use std::fmt::{Result, Write};

use crate::ui::helpers::{truncate, visible_width};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::HeaderInfo;

/// Renders the title bar followed by the location, tab and summary lines.
pub fn render_header(out: &mut String, header: &HeaderInfo, theme: &Theme, cols: usize) -> Result {
    let title = truncate(&header.title, cols);
    let title_len = visible_width(&title);
    let padding = cols.saturating_sub(title_len) / 2;

    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.header_fg));
    if let Some(bg) = &theme.colors.header_bg {
        out.push_str(&Theme::bg(bg));
    }
    out.push_str(&" ".repeat(padding));
    out.push_str(&title);
    out.push_str(&" ".repeat(cols.saturating_sub(padding + title_len)));
    writeln!(out, "{}", Theme::reset())?;

    let activity = if header.is_fetching { "  ⟳" } else { "" };
    writeln!(
        out,
        "{}{}{activity}{}",
        Theme::fg(&theme.colors.text_dim),
        truncate(&header.location, cols.saturating_sub(3)),
        Theme::reset()
    )?;

    if !header.tabs.is_empty() {
        for tab in &header.tabs {
            if tab.is_active {
                write!(
                    out,
                    "{}{}{} {} {}",
                    Theme::bold(),
                    Theme::fg(&theme.colors.selection_fg),
                    Theme::bg(&theme.colors.selection_bg),
                    tab.name,
                    Theme::reset()
                )?;
            } else {
                write!(out, "{} {} {}", Theme::fg(&theme.colors.text_normal), tab.name, Theme::reset())?;
            }
            out.push(' ');
        }
        out.push('\n');
    }

    if let Some(summary) = &header.summary {
        writeln!(out, "{}{summary}{}", Theme::fg(&theme.colors.text_dim), Theme::reset())?;
    }
    Ok(())
}
