//! Caret geometry for text-input surfaces.
//!
//! Computes where a character offset sits, in pixels, inside a textarea-like
//! surface without asking the surface for its caret. Text up to the offset is
//! laid out in an off-screen mirror configured like the real surface, then a
//! marker glyph is appended and its position read back.
//!
//! The mirror needs real glyph advances: construct a [`CaretResolver`] with a
//! [`TextMeasure`] backed by the host's layout engine (or [`MonospaceMeasure`]
//! for fixed-cell fonts).

mod measure;
mod mirror;
mod style;

pub use measure::{MonospaceMeasure, TextMeasure};
pub use style::{BoxSizing, Edges, OverflowWrap, SurfaceStyle, WhiteSpace};

use crate::editor::OffsetMap;
use mirror::Mirror;

/// Glyph used as the marker when the offset is at end-of-buffer.
const END_PLACEHOLDER: char = '.';

/// Caret position relative to the surface's border-box origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaretPosition {
    pub top: f32,
    pub left: f32,
    pub line_height: f32,
}

/// Viewport-relative position for a popup anchored below the caret.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopupAnchor {
    pub top: f32,
    pub left: f32,
}

impl CaretPosition {
    /// Place a popup just under the caret line.
    ///
    /// `surface_origin` is the surface's top-left corner in viewport pixels
    /// and `scroll` its `(scroll_left, scroll_top)`.
    pub fn popup_anchor(&self, surface_origin: (f32, f32), scroll: (f32, f32)) -> PopupAnchor {
        PopupAnchor {
            top: surface_origin.1 + self.top - scroll.1 + self.line_height,
            left: surface_origin.0 + self.left - scroll.0,
        }
    }
}

/// Resolves character offsets to caret pixel positions.
#[derive(Debug, Clone)]
pub struct CaretResolver<M> {
    measure: M,
}

impl<M: TextMeasure> CaretResolver<M> {
    pub const fn new(measure: M) -> Self {
        Self { measure }
    }

    pub const fn measure(&self) -> &M {
        &self.measure
    }

    /// Pixel position of UTF-16 `offset` in `text` rendered with `style`.
    pub fn resolve(&self, style: &SurfaceStyle, text: &str, offset: usize) -> CaretPosition {
        let map = OffsetMap::new(text);
        let at = map.to_byte(offset);
        let marker = text[at..].chars().next().unwrap_or(END_PLACEHOLDER);
        let pen = Mirror::new(style, &self.measure).place(&text[..at], marker);

        #[allow(clippy::cast_precision_loss)]
        let line = pen.line as f32;
        CaretPosition {
            top: style.border.top + style.padding.top + line * style.line_height,
            left: style.border.left + style.padding.left + pen.x,
            line_height: style.line_height,
        }
    }
}
