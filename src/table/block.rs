use std::ops::Range;

use crate::editor::OffsetMap;

/// A run of pipe-prefixed lines around the cursor, split into cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    /// Trimmed cell text per line.
    pub rows: Vec<Vec<String>>,
    /// Row (0-based, within the block) containing the cursor.
    pub active_row: usize,
    /// Column containing the cursor, clamped into the active row.
    pub active_column: usize,
    /// Block span in UTF-16 offsets.
    pub span: Range<usize>,
    /// Block span in bytes, excluding the final line's `\n`.
    pub bytes: Range<usize>,
}

impl TableBlock {
    /// Widest row, in cells.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_separator_row(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|cells| is_separator(cells))
    }
}

/// Find the table block containing UTF-16 `offset`, if the cursor's line is
/// a table line.
pub fn locate(text: &str, offset: usize) -> Option<TableBlock> {
    let map = OffsetMap::new(text);
    let cursor = map.to_byte(offset);

    let lines = line_spans(text);
    let current = lines
        .iter()
        .position(|span| span.start <= cursor && cursor <= span.end)?;
    if !is_table_line(&text[lines[current].clone()]) {
        return None;
    }

    let mut first = current;
    while first > 0 && is_table_line(&text[lines[first - 1].clone()]) {
        first -= 1;
    }
    let mut last = current;
    while last + 1 < lines.len() && is_table_line(&text[lines[last + 1].clone()]) {
        last += 1;
    }

    let rows: Vec<Vec<String>> = lines[first..=last]
        .iter()
        .map(|span| parse_cells(&text[span.clone()]))
        .collect();

    let active_row = current - first;
    let line = &lines[current];
    let pipes_before = text[line.start..cursor].matches('|').count();
    let cells_in_row = rows[active_row].len().max(1);
    let active_column = pipes_before.saturating_sub(1).min(cells_in_row - 1);

    let bytes = lines[first].start..lines[last].end;
    Some(TableBlock {
        rows,
        active_row,
        active_column,
        span: map.to_utf16(bytes.start)..map.to_utf16(bytes.end),
        bytes,
    })
}

/// Byte spans of every line, excluding the `\n`.
fn line_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices('\n') {
        spans.push(start..i);
        start = i + 1;
    }
    spans.push(start..text.len());
    spans
}

fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Split on `|`, drop the pieces before the first and after the last pipe.
pub(crate) fn parse_cells(line: &str) -> Vec<String> {
    let pieces: Vec<&str> = line.trim().split('|').collect();
    if pieces.len() < 2 {
        return Vec::new();
    }
    pieces[1..pieces.len() - 1]
        .iter()
        .map(|cell| cell.trim().to_string())
        .collect()
}

pub(crate) fn is_separator(cells: &[String]) -> bool {
    !cells.is_empty() && cells.iter().all(|cell| is_separator_cell(cell))
}

fn is_separator_cell(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':')
}
