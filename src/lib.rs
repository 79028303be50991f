// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. table::TableBlock)
    clippy::module_name_repetitions
)]

//! # Notemark
//!
//! The editing engine behind a markdown note editor.
//!
//! Notemark is host-agnostic: it works on plain text plus UTF-16 selection
//! offsets, the model a text-input surface exposes, and returns new text and
//! selections or HTML for the host to apply.
//!
//! ## Modules
//!
//! - [`geometry`]: Caret pixel positions inside a text surface
//! - [`table`]: Pipe-table row/column edits and realignment
//! - [`document`]: Markdown to sanitized, cached preview HTML
//! - [`editor`]: Keystroke handling (lists, pairs, formatting, slash menu)
//! - [`diagram`]: Background diagram rendering for preview placeholders
//! - [`highlight`]: Syntax highlighting for fenced code
//! - [`config`]: Defaults from rc files
//! - [`perf`]: Timing scopes and the render debug log

pub mod config;
pub mod diagram;
pub mod document;
pub mod editor;
pub mod geometry;
pub mod highlight;
pub mod perf;
pub mod table;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::document::{MarkdownRenderer, ParsedContent, RenderOptions};
    pub use crate::editor::{EditState, InlineEditor, KeyOutcome, Selection, SlashMenu};
    pub use crate::geometry::{CaretPosition, CaretResolver, SurfaceStyle};
    pub use crate::table::TableAction;
}
