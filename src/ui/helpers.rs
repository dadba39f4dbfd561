//! Shared rendering utilities and helpers.
//!
//! Components build the screen into a `String`. These helpers handle the
//! parts that need care: fitting text into fixed-width cells without splitting
//! characters, and interleaving match highlights with ANSI escape sequences.
//!
//! # Example
//!
//! ```rust
//! use rentadmin::ui::helpers::fit;
//!
//! assert_eq!(fit("Land Cruiser", 8), "Land Cr…");
//! assert_eq!(fit("Kia", 5), "Kia  ");
//! ```

use std::fmt::Write;

use crate::ui::theme::Theme;

/// Number of characters `text` occupies on screen.
#[must_use]
pub fn visible_width(text: &str) -> usize {
    text.chars().count()
}

/// Truncates `text` to `width` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    if visible_width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

/// Truncates or right-pads `text` to exactly `width` characters.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let mut out = truncate(text, width);
    let len = visible_width(&out);
    out.push_str(&" ".repeat(width.saturating_sub(len)));
    out
}

/// Writes `text` fitted to `width`, with the byte `ranges` highlighted.
///
/// Highlights falling into the truncated part are dropped. `restore` is the
/// escape sequence that re-applies the surrounding style after a highlight.
pub fn write_highlighted(
    out: &mut String,
    text: &str,
    width: usize,
    ranges: &[(usize, usize)],
    theme: &Theme,
    restore: &str,
) -> std::fmt::Result {
    let fitted = truncate(text, width);
    // Highlights never apply to the ellipsis itself.
    let visible_bytes = if fitted.len() == text.len() {
        text.len()
    } else {
        fitted.len() - '…'.len_utf8()
    };

    let mut pos = 0;
    for &(start, end) in ranges {
        let end = end.min(visible_bytes);
        if start >= end || start < pos {
            continue;
        }
        out.push_str(&fitted[pos..start]);
        write!(
            out,
            "{}{}{}{}{restore}",
            Theme::fg(&theme.colors.match_highlight_fg),
            Theme::bg(&theme.colors.match_highlight_bg),
            &fitted[start..end],
            Theme::reset(),
        )?;
        pos = end;
    }
    out.push_str(&fitted[pos..]);
    out.push_str(&" ".repeat(width.saturating_sub(visible_width(&fitted))));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_char_aware() {
        assert_eq!(truncate("Kerala", 10), "Kerala");
        assert_eq!(truncate("Škoda Octavia", 6), "Škoda…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn highlights_wrap_the_matched_bytes() {
        let theme = Theme::default();
        let mut out = String::new();
        write_highlighted(&mut out, "Corolla", 9, &[(0, 3)], &theme, "").unwrap();

        let highlight = format!(
            "{}{}Cor{}",
            Theme::fg(&theme.colors.match_highlight_fg),
            Theme::bg(&theme.colors.match_highlight_bg),
            Theme::reset()
        );
        assert!(out.starts_with(&highlight));
        assert!(out.ends_with("olla  "));
    }

    #[test]
    fn highlights_past_the_cut_are_dropped() {
        let theme = Theme::default();
        let mut out = String::new();
        write_highlighted(&mut out, "Land Cruiser", 5, &[(5, 12)], &theme, "").unwrap();
        assert_eq!(out, "Land…");
    }
}
