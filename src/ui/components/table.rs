//! Table component renderer.
//!
//! Renders the listing table: bold column headers, then either data rows,
//! skeleton rows while loading, or the empty/error state. Column widths come
//! from the resource's column definitions.

use std::fmt::{Result, Write};

use crate::domain::ColumnHeader;
use crate::ui::components::empty::{render_empty_state, render_error_state};
use crate::ui::helpers::{self, fit};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{DisplayRow, TableBody};

/// Width of the leading row-number column.
const NUMBER_WIDTH: usize = 4;

/// Header title whose cells are colored by approval status.
const STATUS_HEADER: &str = "STATUS";

pub fn render_table(
    out: &mut String,
    columns: &[ColumnHeader],
    body: &TableBody,
    theme: &Theme,
    cols: usize,
) -> Result {
    render_table_headers(out, columns, theme)?;

    match body {
        TableBody::Loading { skeleton_rows } => render_skeleton_rows(out, columns, *skeleton_rows, theme),
        TableBody::Empty(empty) => render_empty_state(out, empty, theme, cols),
        TableBody::Error { message, retry_hint } => render_error_state(out, message, retry_hint, theme, cols),
        TableBody::Rows(rows) => {
            for row in rows {
                render_table_row(out, columns, row, theme)?;
            }
            Ok(())
        }
    }
}

fn render_table_headers(out: &mut String, columns: &[ColumnHeader], theme: &Theme) -> Result {
    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.header_fg));
    out.push_str(&fit("#", NUMBER_WIDTH));
    for column in columns {
        out.push(' ');
        out.push_str(&fit(column.title, column.width));
    }
    writeln!(out, "{}", Theme::reset())
}

/// Dimmed placeholder bars occupying the table slot while loading.
fn render_skeleton_rows(out: &mut String, columns: &[ColumnHeader], count: usize, theme: &Theme) -> Result {
    for _ in 0..count {
        out.push_str(Theme::dim());
        out.push_str(&Theme::fg(&theme.colors.text_dim));
        out.push_str(&" ".repeat(NUMBER_WIDTH));
        for column in columns {
            let bar = column.width.saturating_sub(2).max(1);
            write!(out, " {}{}", "░".repeat(bar), " ".repeat(column.width - bar.min(column.width)))?;
        }
        writeln!(out, "{}", Theme::reset())?;
    }
    Ok(())
}

/// Renders one row: number, cells, search highlights in the searchable
/// column, and status coloring.
fn render_table_row(out: &mut String, columns: &[ColumnHeader], row: &DisplayRow, theme: &Theme) -> Result {
    let base = if row.is_selected {
        format!(
            "{}{}",
            Theme::fg(&theme.colors.selection_fg),
            Theme::bg(&theme.colors.selection_bg)
        )
    } else {
        Theme::fg(&theme.colors.text_normal)
    };

    out.push_str(&base);
    out.push_str(&fit(&row.number.to_string(), NUMBER_WIDTH));

    for (column, cell) in columns.iter().zip(&row.cells) {
        out.push(' ');
        if column.searchable && !row.is_selected && !row.highlight_ranges.is_empty() {
            helpers::write_highlighted(out, cell, column.width, &row.highlight_ranges, theme, &base)?;
        } else if column.title == STATUS_HEADER && !row.is_selected {
            match row.status {
                Some(status) => {
                    write!(out, "{}{}{base}", Theme::fg(theme.status_color(status)), fit(cell, column.width))?;
                }
                None => out.push_str(&fit(cell, column.width)),
            }
        } else {
            out.push_str(&fit(cell, column.width));
        }
    }

    writeln!(out, "{}", Theme::reset())
}
