use unicode_width::UnicodeWidthStr;

use super::block::{TableBlock, is_separator, locate};
use crate::editor::splice;

/// Narrowest emitted column, so separators stay valid (`---`).
const MIN_COLUMN_WIDTH: usize = 3;

/// Structural edit applied to the table under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    AddRow,
    AddColumn,
    DeleteRow,
    DeleteColumn,
    /// Realign only.
    Format,
}

/// Apply `action` to the table containing UTF-16 `offset`.
///
/// Returns the buffer unchanged when the cursor is not inside a table.
pub fn apply(text: &str, offset: usize, action: TableAction) -> String {
    let Some(block) = locate(text, offset) else {
        return text.to_string();
    };
    let rows = transform(&block, action);
    tracing::debug!(?action, rows = rows.len(), "table transform");
    splice(text, block.bytes.clone(), &realign(&rows))
}

/// Rows after `action`, padded to a rectangle but not yet aligned.
pub fn transform(block: &TableBlock, action: TableAction) -> Vec<Vec<String>> {
    let mut rows = pad_rows(&block.rows);
    let columns = rows.first().map_or(0, Vec::len).max(1);

    match action {
        TableAction::AddRow => {
            let mut at = block.active_row + 1;
            if block.active_row == 0 && rows.get(1).is_some_and(|r| is_separator(r)) {
                at = 2;
            }
            rows.insert(at.min(rows.len()), vec![String::new(); columns]);
        }
        TableAction::AddColumn => {
            for row in &mut rows {
                let cell = if is_separator(row) { "---" } else { "" };
                row.push(cell.to_string());
            }
        }
        TableAction::DeleteRow => {
            if rows.len() > 1 {
                rows.remove(block.active_row.min(rows.len() - 1));
            }
        }
        TableAction::DeleteColumn => {
            if columns > 1 {
                let col = block.active_column.min(columns - 1);
                for row in &mut rows {
                    if col < row.len() {
                        row.remove(col);
                    }
                }
            }
        }
        TableAction::Format => {}
    }
    rows
}

/// Pad ragged rows to the widest row.
fn pad_rows(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    rows.iter()
        .map(|row| {
            let filler = if is_separator(row) { "---" } else { "" };
            let mut row = row.clone();
            row.resize(width, filler.to_string());
            row
        })
        .collect()
}

/// Render rows as an aligned pipe table.
///
/// Column widths come from content rows; separator rows are redrawn to the
/// column width with their `:` markers kept.
pub fn realign(rows: &[Vec<String>]) -> String {
    let rows = pad_rows(rows);
    let columns = rows.first().map_or(0, Vec::len);
    let mut widths = vec![MIN_COLUMN_WIDTH; columns];
    for row in rows.iter().filter(|r| !is_separator(r)) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    rows.iter()
        .map(|row| {
            let separator = is_separator(row);
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    if separator {
                        separator_cell(cell, width)
                    } else {
                        pad_cell(cell, width)
                    }
                })
                .collect();
            if cells.is_empty() {
                "| |".to_string()
            } else {
                format!("| {} |", cells.join(" | "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pad_cell(cell: &str, width: usize) -> String {
    let pad = width.saturating_sub(cell.width());
    format!("{cell}{}", " ".repeat(pad))
}

fn separator_cell(cell: &str, width: usize) -> String {
    let left = cell.starts_with(':');
    let right = cell.len() > 1 && cell.ends_with(':');
    let colons = usize::from(left) + usize::from(right);
    let dashes = "-".repeat(width.saturating_sub(colons).max(1));
    format!(
        "{}{dashes}{}",
        if left { ":" } else { "" },
        if right { ":" } else { "" }
    )
}
