use unicode_width::UnicodeWidthChar;

/// Glyph advance source for the caret mirror.
///
/// Stands in for the live text-shaping engine of the host surface; results
/// are only as accurate as the advances it reports.
pub trait TextMeasure {
    /// Horizontal advance of `ch` in pixels, excluding letter spacing.
    fn advance(&self, ch: char) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(char) -> f32,
{
    fn advance(&self, ch: char) -> f32 {
        self(ch)
    }
}

/// Fixed-cell measurement for monospace fonts.
///
/// Wide (East Asian) glyphs take two cells; control and zero-width
/// characters take none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    cell_width: f32,
}

impl MonospaceMeasure {
    pub const fn new(cell_width: f32) -> Self {
        Self { cell_width }
    }

    /// Approximate cell width for a font size (typical monospace aspect).
    pub fn for_font_size(font_size: f32) -> Self {
        Self::new(font_size * 0.6)
    }

    pub const fn cell_width(&self) -> f32 {
        self.cell_width
    }
}

impl TextMeasure for MonospaceMeasure {
    fn advance(&self, ch: char) -> f32 {
        let cells = ch.width().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let cells = cells as f32;
        cells * self.cell_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_ascii_is_one_cell() {
        let measure = MonospaceMeasure::new(8.0);
        assert!((measure.advance('a') - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_monospace_wide_glyph_is_two_cells() {
        let measure = MonospaceMeasure::new(8.0);
        assert!((measure.advance('漢') - 16.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_monospace_zero_width_is_zero() {
        let measure = MonospaceMeasure::new(8.0);
        assert!(measure.advance('\u{200B}').abs() < f32::EPSILON);
        assert!(measure.advance('\u{7}').abs() < f32::EPSILON);
    }

    #[test]
    fn test_closure_measure() {
        let measure = |ch: char| if ch == 'W' { 12.0 } else { 6.0 };
        assert!((measure.advance('W') - 12.0).abs() < f32::EPSILON);
    }
}
