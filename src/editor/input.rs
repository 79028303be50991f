use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::buffer::{EditState, OffsetMap, Selection, line_start, splice, utf16_len};
use super::format::{self, InlineFormat};
use super::lists::{self, Continuation};

/// Result of feeding one key event to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not ours: let the surface apply its default behaviour.
    PassThrough,
    /// Default suppressed; replace the surface content with this state.
    Edit(EditState),
    /// Default insertion of `/` proceeds; open the command menu for the `/`
    /// that lands at `trigger`.
    OpenSlashMenu { trigger: usize },
    /// Default suppressed; close the command menu, buffer untouched.
    CloseSlashMenu,
}

impl KeyOutcome {
    /// Whether the surface's default handling must be suppressed.
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Edit(_) | Self::CloseSlashMenu)
    }
}

/// Keystroke-level markdown editing.
///
/// Holds only configuration; every decision is a function of the buffer,
/// selection, key and whether the slash menu is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineEditor {
    indent: String,
}

impl Default for InlineEditor {
    fn default() -> Self {
        Self::new(2)
    }
}

impl InlineEditor {
    /// Create an editor that indents with `indent_width` spaces on Tab.
    pub fn new(indent_width: usize) -> Self {
        Self {
            indent: " ".repeat(indent_width.max(1)),
        }
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }

    pub fn handle_key(&self, state: &EditState, key: KeyEvent, menu_open: bool) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::PassThrough;
        }

        let command = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char(ch) if command && !alt => InlineFormat::for_shortcut(ch)
                .map_or(KeyOutcome::PassThrough, |fmt| {
                    KeyOutcome::Edit(format::toggle(state, fmt))
                }),
            KeyCode::Esc if menu_open => KeyOutcome::CloseSlashMenu,
            KeyCode::Tab if key.modifiers.is_empty() => KeyOutcome::Edit(self.insert_indent(state)),
            KeyCode::Enter if key.modifiers.is_empty() && state.selection.is_collapsed() => {
                continue_list(state).map_or(KeyOutcome::PassThrough, KeyOutcome::Edit)
            }
            KeyCode::Char(ch) if !command && !alt && state.selection.is_collapsed() => {
                if let Some(close) = closing_pair(ch) {
                    return KeyOutcome::Edit(insert_pair(state, ch, close));
                }
                if ch == '/' {
                    return slash_trigger(state)
                        .map_or(KeyOutcome::PassThrough, |trigger| {
                            KeyOutcome::OpenSlashMenu { trigger }
                        });
                }
                KeyOutcome::PassThrough
            }
            _ => KeyOutcome::PassThrough,
        }
    }

    fn insert_indent(&self, state: &EditState) -> EditState {
        let map = OffsetMap::new(&state.text);
        let range = map.byte_range(state.selection);
        let cursor = map.to_utf16(range.start) + utf16_len(&self.indent);
        let text = splice(&state.text, range, &self.indent);
        EditState {
            text,
            selection: Selection::cursor(cursor),
        }
    }
}

const fn closing_pair(ch: char) -> Option<char> {
    match ch {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '"' => Some('"'),
        '\'' => Some('\''),
        _ => None,
    }
}

fn insert_pair(state: &EditState, open: char, close: char) -> EditState {
    let map = OffsetMap::new(&state.text);
    let at = map.to_byte(state.selection.start);
    let cursor = map.to_utf16(at) + open.len_utf16();
    let text = splice(&state.text, at..at, &format!("{open}{close}"));
    EditState {
        text,
        selection: Selection::cursor(cursor),
    }
}

/// Where a `/` typed now would land, if it may open the menu there.
fn slash_trigger(state: &EditState) -> Option<usize> {
    let map = OffsetMap::new(&state.text);
    let at = map.to_byte(state.selection.start);
    state.text[..at]
        .chars()
        .next_back()
        .is_none_or(char::is_whitespace)
        .then(|| map.to_utf16(at))
}

fn continue_list(state: &EditState) -> Option<EditState> {
    let map = OffsetMap::new(&state.text);
    let cursor = map.to_byte(state.selection.start);
    let start = line_start(&state.text, cursor);

    match lists::analyze(&state.text[start..cursor]) {
        Continuation::Continue(marker) => {
            let insert = format!("\n{marker}");
            let next = map.to_utf16(cursor) + utf16_len(&insert);
            let text = splice(&state.text, cursor..cursor, &insert);
            Some(EditState {
                text,
                selection: Selection::cursor(next),
            })
        }
        Continuation::ClearLine => {
            let text = splice(&state.text, start..cursor, "");
            let line_start_utf16 = map.to_utf16(start);
            Some(EditState {
                text,
                selection: Selection::cursor(line_start_utf16),
            })
        }
        Continuation::None => None,
    }
}
