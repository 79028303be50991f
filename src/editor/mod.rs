//! Keystroke-level markdown editing.
//!
//! Works on a flat text buffer plus a UTF-16 selection, the same model as
//! the host text-input surface. Decisions depend only on the current line,
//! the key and its modifiers; there is no hidden mode state.

mod buffer;
mod format;
mod input;
mod lists;
mod slash;

pub use buffer::{EditState, OffsetMap, Selection, line_end, line_start, splice, utf16_len};
pub use format::{InlineFormat, toggle as toggle_format};
pub use input::{InlineEditor, KeyOutcome};
pub use lists::{Continuation, analyze as analyze_list_line};
pub use slash::{SlashCommand, SlashMenu, apply_command as apply_slash_command};
