use ropey::Rope;

/// A `{start, end}` selection measured in UTF-16 code units.
///
/// `start == end` is a collapsed cursor. `start` is always the lower bound;
/// use [`Selection::new`] to normalize a backwards selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Create a selection, swapping the bounds if they are reversed.
    pub const fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A collapsed cursor at `offset`.
    pub const fn cursor(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Buffer text plus selection, the unit every editing operation consumes
/// and produces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditState {
    pub text: String,
    pub selection: Selection,
}

impl EditState {
    pub fn new(text: impl Into<String>, selection: Selection) -> Self {
        Self {
            text: text.into(),
            selection,
        }
    }

    /// State with a collapsed cursor at `offset`.
    pub fn with_cursor(text: impl Into<String>, offset: usize) -> Self {
        Self::new(text, Selection::cursor(offset))
    }

    /// Length of the buffer in UTF-16 code units.
    pub fn len_utf16(&self) -> usize {
        utf16_len(&self.text)
    }
}

/// Maps between UTF-16 offsets used by the host surface and byte offsets
/// into the Rust string.
///
/// Offsets past the end clamp to the end. An offset that lands inside a
/// surrogate pair snaps back to the start of that character.
pub struct OffsetMap<'a> {
    text: &'a str,
    rope: Rope,
}

impl<'a> OffsetMap<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            rope: Rope::from_str(text),
        }
    }

    /// Byte index for a UTF-16 offset.
    pub fn to_byte(&self, utf16: usize) -> usize {
        let utf16 = utf16.min(self.rope.len_utf16_cu());
        let mut char_idx = self.rope.utf16_cu_to_char(utf16);
        // Never land past a mid-surrogate offset.
        if char_idx > 0 && self.rope.char_to_utf16_cu(char_idx) > utf16 {
            char_idx -= 1;
        }
        self.rope.char_to_byte(char_idx)
    }

    /// UTF-16 offset for a byte index. The index must be a char boundary.
    pub fn to_utf16(&self, byte: usize) -> usize {
        let byte = byte.min(self.text.len());
        let char_idx = self.rope.byte_to_char(byte);
        self.rope.char_to_utf16_cu(char_idx)
    }

    /// Byte range for a selection.
    pub fn byte_range(&self, selection: Selection) -> std::ops::Range<usize> {
        self.to_byte(selection.start)..self.to_byte(selection.end)
    }

    pub const fn text(&self) -> &'a str {
        self.text
    }
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte index of the start of the line containing `byte`.
pub fn line_start(text: &str, byte: usize) -> usize {
    text[..byte].rfind('\n').map_or(0, |i| i + 1)
}

/// Byte index of the end of the line containing `byte` (exclusive of `\n`).
pub fn line_end(text: &str, byte: usize) -> usize {
    text[byte..].find('\n').map_or(text.len(), |i| byte + i)
}

/// Build a new buffer by replacing `range` (bytes) with `replacement`.
pub fn splice(text: &str, range: std::ops::Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() - range.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}
