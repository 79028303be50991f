use serde::Deserialize;

/// Per-side box lengths in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const fn uniform(px: f32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxSizing {
    ContentBox,
    #[default]
    BorderBox,
}

/// CSS `white-space` values that affect caret placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhiteSpace {
    Normal,
    Nowrap,
    Pre,
    #[default]
    PreWrap,
    PreLine,
}

impl WhiteSpace {
    /// Lines wrap at the content width.
    pub const fn wraps(self) -> bool {
        matches!(self, Self::Normal | Self::PreWrap | Self::PreLine)
    }

    /// `\n` forces a line break.
    pub const fn preserves_newlines(self) -> bool {
        matches!(self, Self::Pre | Self::PreWrap | Self::PreLine)
    }

    /// Runs of spaces render as a single space.
    pub const fn collapses_spaces(self) -> bool {
        matches!(self, Self::Normal | Self::Nowrap | Self::PreLine)
    }
}

/// CSS `overflow-wrap` (a.k.a. `word-wrap`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowWrap {
    Normal,
    #[default]
    BreakWord,
    Anywhere,
}

impl OverflowWrap {
    pub const fn breaks_words(self) -> bool {
        matches!(self, Self::BreakWord | Self::Anywhere)
    }
}

/// Computed style of the text-input surface, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceStyle {
    /// Font size in pixels.
    pub font_size: f32,
    /// Line height in pixels.
    pub line_height: f32,
    /// Extra advance after every glyph.
    pub letter_spacing: f32,
    /// Tab stop width in spaces.
    pub tab_size: u32,
    /// Width of the surface (border box or content box per `box_sizing`).
    pub width: f32,
    pub padding: Edges,
    pub border: Edges,
    pub box_sizing: BoxSizing,
    pub white_space: WhiteSpace,
    #[serde(alias = "wordWrap")]
    pub overflow_wrap: OverflowWrap,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            line_height: 20.0,
            letter_spacing: 0.0,
            tab_size: 8,
            width: 600.0,
            padding: Edges::uniform(8.0),
            border: Edges::uniform(1.0),
            box_sizing: BoxSizing::BorderBox,
            white_space: WhiteSpace::PreWrap,
            overflow_wrap: OverflowWrap::BreakWord,
        }
    }
}

impl SurfaceStyle {
    /// Parse the host's computed-style JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Width available to text.
    pub fn content_width(&self) -> f32 {
        let inner = match self.box_sizing {
            BoxSizing::BorderBox => {
                self.width - self.padding.horizontal() - self.border.horizontal()
            }
            BoxSizing::ContentBox => self.width,
        };
        inner.max(0.0)
    }
}
