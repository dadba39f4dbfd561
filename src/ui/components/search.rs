//! Search bar component renderer.
//!
//! Renders the search input box with a bordered frame. The border uses the
//! accent color while the input has focus.

use std::fmt::{Result, Write};

use crate::ui::helpers::{truncate, visible_width};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::SearchBarInfo;

const SEARCH_BOX_MARGIN: usize = 2;

pub fn render_search_bar(out: &mut String, search: &SearchBarInfo, theme: &Theme, cols: usize) -> Result {
    let box_width = cols.saturating_sub(SEARCH_BOX_MARGIN * 2);
    let inner_width = box_width.saturating_sub(2);
    let margin = " ".repeat(SEARCH_BOX_MARGIN);
    let border = if search.is_focused {
        Theme::fg(&theme.colors.search_bar_border)
    } else {
        Theme::fg(&theme.colors.border)
    };

    writeln!(out, "{margin}{border}┌{}┐{}", "─".repeat(inner_width), Theme::reset())?;

    let cursor = if search.is_focused { "▏" } else { "" };
    let pending = if search.is_pending { " …" } else { "" };
    let search_text = truncate(&format!(" Search: {}{cursor}{pending}", search.query), inner_width);
    let padding = inner_width.saturating_sub(visible_width(&search_text));
    writeln!(
        out,
        "{margin}{border}│{}{search_text}{}{border}│{}",
        Theme::fg(&theme.colors.text_normal),
        " ".repeat(padding),
        Theme::reset()
    )?;

    writeln!(out, "{margin}{border}└{}┘{}", "─".repeat(inner_width), Theme::reset())
}
