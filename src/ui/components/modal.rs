//! Dialog component renderer.

use std::fmt::{Result, Write};

use crate::ui::helpers::fit;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::ModalView;

const MODAL_MARGIN: usize = 4;

/// Renders a boxed dialog below the table.
pub fn render_modal(out: &mut String, modal: &ModalView, theme: &Theme, cols: usize) -> Result {
    let inner_width = cols.saturating_sub(MODAL_MARGIN * 2 + 2).max(10);
    let margin = " ".repeat(MODAL_MARGIN);
    let border = Theme::fg(&theme.colors.search_bar_border);
    let text = Theme::fg(&theme.colors.text_normal);
    let reset = Theme::reset();

    writeln!(out, "{margin}{border}┌{}┐{reset}", "─".repeat(inner_width))?;
    writeln!(
        out,
        "{margin}{border}│{}{}{}{reset}{border}│{reset}",
        Theme::bold(),
        text,
        fit(&format!(" {}", modal.title), inner_width)
    )?;

    for line in &modal.lines {
        writeln!(out, "{margin}{border}│{text}{}{border}│{reset}", fit(&format!(" {line}"), inner_width))?;
    }

    for option in &modal.options {
        writeln!(
            out,
            "{margin}{border}│{text}{}{border}│{reset}",
            fit(&format!("   • {}", option.label), inner_width)
        )?;
    }

    if let Some(error) = &modal.error {
        writeln!(
            out,
            "{margin}{border}│{}{}{border}│{reset}",
            Theme::fg(&theme.colors.error_fg),
            fit(&format!(" {error}"), inner_width)
        )?;
    }

    writeln!(
        out,
        "{margin}{border}│{}{}{reset}{border}│{reset}",
        Theme::fg(&theme.colors.text_dim),
        fit(&format!(" {}", modal.hint), inner_width)
    )?;
    writeln!(out, "{margin}{border}└{}┘{reset}", "─".repeat(inner_width))
}
