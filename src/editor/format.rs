//! Symmetric delimiter toggling (bold, italic, link, inline code).

use super::buffer::{EditState, OffsetMap, Selection, splice};

/// A markdown span style that wraps text in a prefix/suffix pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineFormat {
    Bold,
    Italic,
    Link,
    Code,
}

impl InlineFormat {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Bold => "**",
            Self::Italic => "*",
            Self::Link => "[",
            Self::Code => "`",
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Bold => "**",
            Self::Italic => "*",
            Self::Link => "](url)",
            Self::Code => "`",
        }
    }

    /// Text inserted when wrapping an empty selection.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Bold => "bold text",
            Self::Italic => "italic text",
            Self::Link => "link text",
            Self::Code => "code",
        }
    }

    /// Format bound to a shortcut letter (used with Ctrl/Cmd).
    pub const fn for_shortcut(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'b' => Some(Self::Bold),
            'i' => Some(Self::Italic),
            'k' => Some(Self::Link),
            'e' => Some(Self::Code),
            _ => None,
        }
    }
}

/// Toggle `format` around the current selection.
///
/// Strips the delimiters when the selection starts and ends with them, or
/// when they sit immediately outside it; otherwise wraps. The affected inner
/// text is selected afterwards.
///
/// A delimiter only counts when its whole run of marker characters can hold
/// it, so italic inside `**bold**` nests as `***bold***` instead of eating
/// one star of the bold run.
pub fn toggle(state: &EditState, format: InlineFormat) -> EditState {
    let map = OffsetMap::new(&state.text);
    let range = map.byte_range(state.selection);
    let text = state.text.as_str();
    let (prefix, suffix) = (format.prefix(), format.suffix());
    let selected = &text[range.clone()];

    if selected.len() >= prefix.len() + suffix.len()
        && selected.starts_with(prefix)
        && selected.ends_with(suffix)
        && owns_delimiters(text, format, range.start + prefix.len(), range.end)
    {
        let inner = &selected[prefix.len()..selected.len() - suffix.len()];
        let next = splice(text, range.clone(), inner);
        return select_bytes(next, range.start, range.start + inner.len());
    }

    if text[..range.start].ends_with(prefix)
        && text[range.end..].starts_with(suffix)
        && owns_delimiters(text, format, range.start, range.end)
    {
        let outer = range.start - prefix.len()..range.end + suffix.len();
        let next = splice(text, outer.clone(), selected);
        return select_bytes(next, outer.start, outer.start + selected.len());
    }

    let body = if range.is_empty() {
        format.placeholder()
    } else {
        selected
    };
    let wrapped = format!("{prefix}{body}{suffix}");
    let next = splice(text, range.clone(), &wrapped);
    let start = range.start + prefix.len();
    select_bytes(next, start, start + body.len())
}

/// Whether the marker runs touching `open` and `close` can each hold one
/// delimiter of `format`.
///
/// A single marker needs an odd run (`*` in `***`, not in `**`); a wider one
/// needs a run at least as wide. Formats whose delimiters are not one
/// repeated character always qualify.
fn owns_delimiters(text: &str, format: InlineFormat, open: usize, close: usize) -> bool {
    let prefix = format.prefix();
    let Some(marker) = repeated_marker(prefix) else {
        return true;
    };
    if prefix != format.suffix() {
        return true;
    }
    let width = prefix.len();
    let fits = |run: usize| if width == 1 { run % 2 == 1 } else { run >= width };
    fits(run_at(text, open, marker)) && fits(run_at(text, close, marker))
}

/// The single character `delimiter` repeats, if it is one.
fn repeated_marker(delimiter: &str) -> Option<char> {
    let mut chars = delimiter.chars();
    let first = chars.next()?;
    chars.all(|ch| ch == first).then_some(first)
}

/// Length of the run of `marker` that touches byte offset `at`.
fn run_at(text: &str, at: usize, marker: char) -> usize {
    let before = text[..at].chars().rev().take_while(|&ch| ch == marker).count();
    let after = text[at..].chars().take_while(|&ch| ch == marker).count();
    before + after
}

fn select_bytes(text: String, start: usize, end: usize) -> EditState {
    let map = OffsetMap::new(&text);
    let selection = Selection::new(map.to_utf16(start), map.to_utf16(end));
    EditState { text, selection }
}
