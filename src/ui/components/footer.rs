//! Footer component renderer.
//!
//! Renders the pagination strip, the latest notifications and the centered
//! keybinding hints.

use std::fmt::{Result, Write};

use crate::app::modes::ToastKind;
use crate::ui::helpers::{truncate, visible_width};
use crate::ui::pagination::{PageItem, PaginationModel};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::FooterInfo;

/// Renders `‹ prev  1 … 4 [5] 6 … 10  next ›`. Disabled ends are dimmed.
pub fn render_pagination(out: &mut String, pagination: &PaginationModel, theme: &Theme) -> Result {
    let enabled = Theme::fg(&theme.colors.text_normal);
    let disabled = format!("{}{}", Theme::dim(), Theme::fg(&theme.colors.text_dim));

    let prev_style = if pagination.prev_enabled { &enabled } else { &disabled };
    write!(out, "{prev_style}‹ prev{} ", Theme::reset())?;

    for item in &pagination.items {
        match item {
            PageItem::Page(page) if *page == pagination.current => write!(
                out,
                " {}{}[{page}]{}",
                Theme::bold(),
                Theme::fg(&theme.colors.search_bar_border),
                Theme::reset()
            )?,
            PageItem::Page(page) => write!(out, " {enabled}{page}{}", Theme::reset())?,
            PageItem::Ellipsis => write!(out, " {disabled}…{}", Theme::reset())?,
        }
    }

    let next_style = if pagination.next_enabled { &enabled } else { &disabled };
    writeln!(out, "  {next_style}next ›{}", Theme::reset())
}

pub fn render_footer(out: &mut String, footer: &FooterInfo, theme: &Theme, cols: usize) -> Result {
    for toast in &footer.toasts {
        let (color, marker) = match toast.kind {
            ToastKind::Success => (&theme.colors.toast_success, "✓"),
            ToastKind::Destructive => (&theme.colors.toast_destructive, "✗"),
        };
        writeln!(
            out,
            "{}{marker} {}{}",
            Theme::fg(color),
            truncate(&toast.message, cols.saturating_sub(2)),
            Theme::reset()
        )?;
    }

    let help_text = truncate(&footer.keybindings, cols);
    let text_len = visible_width(&help_text);
    let padding = cols.saturating_sub(text_len) / 2;

    writeln!(
        out,
        "{}{}{help_text}{}{}",
        Theme::fg(&theme.colors.text_dim),
        " ".repeat(padding),
        " ".repeat(cols.saturating_sub(padding + text_len)),
        Theme::reset()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_page_is_bracketed() {
        let mut out = String::new();
        let pagination = PaginationModel::compute(2, 3, 47).unwrap();
        render_pagination(&mut out, &pagination, &Theme::default()).unwrap();
        assert!(out.contains("[2]"));
        assert!(out.contains("prev"));
        assert!(out.contains("next"));
    }
}
