//! Slash-command menu: snippets inserted in place of a typed `/`.

use crate::geometry::PopupAnchor;

use super::buffer::{EditState, OffsetMap, Selection, splice, utf16_len};

/// An entry of the slash menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    TaskList,
    Quote,
    CodeBlock,
    Table,
    Image,
    Link,
    Divider,
    MathBlock,
}

impl SlashCommand {
    pub const ALL: [Self; 13] = [
        Self::Heading1,
        Self::Heading2,
        Self::Heading3,
        Self::BulletList,
        Self::NumberedList,
        Self::TaskList,
        Self::Quote,
        Self::CodeBlock,
        Self::Table,
        Self::Image,
        Self::Link,
        Self::Divider,
        Self::MathBlock,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Heading1 => "Heading 1",
            Self::Heading2 => "Heading 2",
            Self::Heading3 => "Heading 3",
            Self::BulletList => "Bullet list",
            Self::NumberedList => "Numbered list",
            Self::TaskList => "Task list",
            Self::Quote => "Quote",
            Self::CodeBlock => "Code block",
            Self::Table => "Table",
            Self::Image => "Image",
            Self::Link => "Link",
            Self::Divider => "Divider",
            Self::MathBlock => "Math block",
        }
    }

    /// Markdown that replaces the trigger `/`.
    pub const fn snippet(self) -> &'static str {
        match self {
            Self::Heading1 => "# ",
            Self::Heading2 => "## ",
            Self::Heading3 => "### ",
            Self::BulletList => "- ",
            Self::NumberedList => "1. ",
            Self::TaskList => "- [ ] ",
            Self::Quote => "> ",
            Self::CodeBlock => "```\n\n```",
            Self::Table => "| Column 1 | Column 2 |\n| -------- | -------- |\n|          |          |",
            Self::Image => "![alt text]()",
            Self::Link => "[link text]()",
            Self::Divider => "---\n",
            Self::MathBlock => "$$\n\n$$",
        }
    }

    /// Cursor position inside the snippet after insertion, in UTF-16 units.
    pub const fn cursor_offset(self) -> usize {
        match self {
            // body line of the fence
            Self::CodeBlock => 4,
            Self::MathBlock => 3,
            // first body cell
            Self::Table => 50,
            // inside the empty parentheses
            Self::Image => 12,
            Self::Link => 12,
            Self::Heading1
            | Self::Heading2
            | Self::Heading3
            | Self::BulletList
            | Self::NumberedList
            | Self::TaskList
            | Self::Quote
            | Self::Divider => self.snippet().len(),
        }
    }
}

/// An open slash menu: where it was triggered and where it floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlashMenu {
    trigger: usize,
    anchor: PopupAnchor,
}

impl SlashMenu {
    /// Record the trigger offset (UTF-16 offset of the `/`) and popup anchor.
    pub const fn open(trigger: usize, anchor: PopupAnchor) -> Self {
        Self { trigger, anchor }
    }

    pub const fn trigger(&self) -> usize {
        self.trigger
    }

    pub const fn anchor(&self) -> PopupAnchor {
        self.anchor
    }

    /// Replace the trigger `/` with `command`'s snippet.
    ///
    /// Returns `None` if the buffer no longer has a `/` at the trigger offset.
    pub fn choose(&self, state: &EditState, command: SlashCommand) -> Option<EditState> {
        apply_command(state, self.trigger, command)
    }
}

/// Replace the `/` at `trigger` with `command`'s snippet and place the cursor
/// at the command's offset.
pub fn apply_command(state: &EditState, trigger: usize, command: SlashCommand) -> Option<EditState> {
    let map = OffsetMap::new(&state.text);
    let start = map.to_byte(trigger);
    if !state.text[start..].starts_with('/') {
        return None;
    }
    let snippet = command.snippet();
    let text = splice(&state.text, start..start + 1, snippet);
    let cursor = trigger + command.cursor_offset().min(utf16_len(snippet));
    Some(EditState {
        text,
        selection: Selection::cursor(cursor),
    })
}
