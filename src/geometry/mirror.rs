use super::measure::TextMeasure;
use super::style::SurfaceStyle;

/// Pen position inside the content box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(super) struct Pen {
    pub line: usize,
    pub x: f32,
}

/// Off-screen line layout that reproduces the surface's wrapping rules.
pub(super) struct Mirror<'a, M: ?Sized> {
    style: &'a SurfaceStyle,
    measure: &'a M,
    width: f32,
    pen: Pen,
    /// Last glyph emitted was a collapsible space.
    after_space: bool,
}

enum Run {
    Newline,
    Space(Vec<char>),
    Word(Vec<char>),
}

impl<'a, M: TextMeasure + ?Sized> Mirror<'a, M> {
    pub fn new(style: &'a SurfaceStyle, measure: &'a M) -> Self {
        Self {
            style,
            measure,
            width: style.content_width(),
            pen: Pen::default(),
            after_space: false,
        }
    }

    /// Lay out `text` followed by `marker` and return the marker's pen.
    pub fn place(mut self, text: &str, marker: char) -> Pen {
        let chars: Vec<char> = text.chars().chain(std::iter::once(marker)).collect();
        let marker_idx = chars.len() - 1;
        let mut idx = 0;
        let mut marker_pen = None;

        for run in split_runs(&chars) {
            let run_len = match &run {
                Run::Newline => 1,
                Run::Space(cs) | Run::Word(cs) => cs.len(),
            };
            let marker_offset = (idx..idx + run_len)
                .contains(&marker_idx)
                .then(|| marker_idx - idx);
            let pen = self.lay_run(&run, marker_offset);
            if marker_pen.is_none() {
                marker_pen = pen;
            }
            idx += run_len;
        }

        marker_pen.unwrap_or(self.pen)
    }

    fn lay_run(&mut self, run: &Run, marker_offset: Option<usize>) -> Option<Pen> {
        match run {
            Run::Newline => {
                let at = self.pen;
                if self.style.white_space.preserves_newlines() {
                    self.break_line();
                    self.after_space = false;
                } else {
                    self.space(' ');
                }
                marker_offset.map(|_| at)
            }
            Run::Space(cs) => {
                let mut hit = None;
                for (i, &ch) in cs.iter().enumerate() {
                    if marker_offset == Some(i) {
                        hit = Some(self.pen);
                    }
                    self.space(ch);
                }
                hit
            }
            Run::Word(cs) => {
                self.after_space = false;
                let word_width: f32 = cs.iter().map(|&c| self.glyph(c)).sum();
                if self.style.white_space.wraps()
                    && self.pen.x > 0.0
                    && self.pen.x + word_width > self.width
                {
                    self.break_line();
                }
                let mut hit = None;
                for (i, &ch) in cs.iter().enumerate() {
                    let advance = self.glyph(ch);
                    if self.style.white_space.wraps()
                        && self.style.overflow_wrap.breaks_words()
                        && self.pen.x > 0.0
                        && self.pen.x + advance > self.width
                    {
                        self.break_line();
                    }
                    if marker_offset == Some(i) {
                        hit = Some(self.pen);
                    }
                    self.pen.x += advance;
                }
                hit
            }
        }
    }

    fn space(&mut self, ch: char) {
        if self.style.white_space.collapses_spaces() {
            if self.after_space {
                return;
            }
            self.after_space = true;
            self.pen.x += self.glyph(' ');
            return;
        }
        if ch == '\t' {
            let stop = self.tab_stop();
            if stop > 0.0 {
                self.pen.x = ((self.pen.x / stop).floor() + 1.0) * stop;
            }
            return;
        }
        self.pen.x += self.glyph(ch);
    }

    fn glyph(&self, ch: char) -> f32 {
        self.measure.advance(ch) + self.style.letter_spacing
    }

    fn tab_stop(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let cells = self.style.tab_size as f32;
        cells * self.glyph(' ')
    }

    fn break_line(&mut self) {
        self.pen.line += 1;
        self.pen.x = 0.0;
    }
}

fn split_runs(chars: &[char]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '\n' {
            runs.push(Run::Newline);
            i += 1;
            continue;
        }
        let is_space = is_break_space(ch);
        let start = i;
        while i < chars.len() && chars[i] != '\n' && is_break_space(chars[i]) == is_space {
            i += 1;
        }
        let run = chars[start..i].to_vec();
        runs.push(if is_space { Run::Space(run) } else { Run::Word(run) });
    }
    runs
}

const fn is_break_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t')
}
