//! Opaque tokens that carry pre-rendered fragments through the markdown
//! parser.
//!
//! Math and wiki links are rendered before parsing and swapped for
//! private-use-area tokens, which the parser treats as plain text. After
//! HTML generation the tokens are swapped back.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::frontmatter::fence_marker;

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{E000}([IBW])(\\d+)\u{E001}").expect("valid token regex")
});

static BLOCK_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("<p>\\s*\u{E000}B(\\d+)\u{E001}\\s*</p>").expect("valid block token regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    InlineMath,
    BlockMath,
    WikiLink,
}

impl TokenKind {
    const fn tag(self) -> char {
        match self {
            Self::InlineMath => 'I',
            Self::BlockMath => 'B',
            Self::WikiLink => 'W',
        }
    }
}

#[derive(Debug)]
struct Fragment {
    html: String,
    /// Stand-in where markup is not allowed, such as attribute values.
    text: String,
}

/// Fragments parked while the markdown parser runs.
#[derive(Debug, Default)]
pub struct Tokens {
    fragments: Vec<Fragment>,
}

impl Tokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `html` and return the token that stands in for it. `text` is
    /// used instead of `html` when the token lands in an attribute.
    pub fn push(&mut self, kind: TokenKind, html: String, text: &str) -> String {
        let index = self.fragments.len();
        self.fragments.push(Fragment {
            html,
            text: text.to_string(),
        });
        format!("{OPEN}{}{index}{CLOSE}", kind.tag())
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Swap tokens in `html` for their fragments.
    ///
    /// A block-math token that is alone in a paragraph replaces the
    /// paragraph with a display block.
    pub fn restore(&self, html: &str) -> String {
        if self.fragments.is_empty() {
            return html.to_string();
        }
        let html = BLOCK_PARAGRAPH.replace_all(html, |caps: &Captures<'_>| {
            format!(
                "<div class=\"math math-display\">{}</div>",
                self.fragment(&caps[1])
            )
        });
        TOKEN
            .replace_all(&html, |caps: &Captures<'_>| {
                let fragment = self.fragment(&caps[2]);
                match &caps[1] {
                    "I" => format!("<span class=\"math math-inline\">{fragment}</span>"),
                    "B" => format!("<span class=\"math math-display\">{fragment}</span>"),
                    _ => fragment.to_string(),
                }
            })
            .into_owned()
    }

    /// Swap tokens in `text` for their plain-text stand-ins.
    pub fn plain(&self, text: &str) -> String {
        if !text.contains(OPEN) {
            return text.to_string();
        }
        TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                self.get(&caps[2])
                    .map_or_else(String::new, |fragment| fragment.text.clone())
            })
            .into_owned()
    }

    fn get(&self, index: &str) -> Option<&Fragment> {
        index
            .parse::<usize>()
            .ok()
            .and_then(|i| self.fragments.get(i))
    }

    fn fragment(&self, index: &str) -> &str {
        self.get(index).map_or("", |fragment| fragment.html.as_str())
    }
}

/// Drop stray token delimiters from user input.
pub fn scrub(text: &str) -> String {
    text.replace([OPEN, CLOSE], "")
}

/// A slice of the document, either code (left verbatim) or prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Code(&'a str),
    Prose(&'a str),
}

/// Split `text` into fenced code blocks, inline code spans and prose.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut prose_start = 0;
    let mut fence: Option<String> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let indent = line.len() - line.trim_start_matches(' ').len();
        let trimmed = line.trim_start();

        if let Some(open) = &fence {
            if closes_fence(trimmed, open) {
                fence = None;
                out.push(Segment::Code(&text[prose_start..offset]));
                prose_start = offset;
            }
            continue;
        }
        if indent <= 3 {
            if let Some(marker) = fence_marker(trimmed) {
                if prose_start < line_start {
                    out.push(Segment::Prose(&text[prose_start..line_start]));
                }
                prose_start = line_start;
                fence = Some(marker);
                continue;
            }
        }

        for (start, end) in inline_code_spans(line) {
            let (start, end) = (line_start + start, line_start + end);
            if prose_start < start {
                out.push(Segment::Prose(&text[prose_start..start]));
            }
            out.push(Segment::Code(&text[start..end]));
            prose_start = end;
        }
    }

    if prose_start < text.len() {
        let rest = &text[prose_start..];
        out.push(if fence.is_some() {
            Segment::Code(rest)
        } else {
            Segment::Prose(rest)
        });
    }
    out
}

fn closes_fence(trimmed: &str, open: &str) -> bool {
    let Some(ch) = open.chars().next() else {
        return false;
    };
    trimmed.starts_with(open) && trimmed.trim_start_matches(ch).trim().is_empty()
}

/// Byte ranges of backtick code spans that open and close on `line`.
fn inline_code_spans(line: &str) -> Vec<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let run = bytes[i..].iter().take_while(|b| **b == b'`').count();
                match find_closing_run(bytes, i + run, run) {
                    Some(close) => {
                        spans.push((i, close + run));
                        i = close + run;
                    }
                    None => i += run,
                }
            }
            _ => i += 1,
        }
    }
    spans
}

fn find_closing_run(bytes: &[u8], from: usize, run: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let len = bytes[j..].iter().take_while(|b| **b == b'`').count();
            if len == run {
                return Some(j);
            }
            j += len;
        } else {
            j += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(bool, &str)> {
        segments(text)
            .into_iter()
            .map(|s| match s {
                Segment::Code(c) => (true, c),
                Segment::Prose(p) => (false, p),
            })
            .collect()
    }

    #[test]
    fn test_segments_fenced_block() {
        let parts = kinds("a\n```\n$x$\n```\nb");
        assert_eq!(
            parts,
            vec![(false, "a\n"), (true, "```\n$x$\n```\n"), (false, "b")]
        );
    }

    #[test]
    fn test_segments_inline_code() {
        let parts = kinds("see `$x$` and $y$");
        assert_eq!(
            parts,
            vec![(false, "see "), (true, "`$x$`"), (false, " and $y$")]
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let parts = kinds("a\n~~~\ncode");
        assert_eq!(parts, vec![(false, "a\n"), (true, "~~~\ncode")]);
    }

    #[test]
    fn test_unmatched_backtick_is_prose() {
        assert_eq!(kinds("a ` b"), vec![(false, "a ` b")]);
    }

    #[test]
    fn test_segments_cover_input() {
        let text = "x `y` z\n```rust\nfn a() {}\n```\n``a`b`` end";
        let joined: String = segments(text)
            .into_iter()
            .map(|s| match s {
                Segment::Code(c) | Segment::Prose(c) => c,
            })
            .collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_restore_swaps_tokens() {
        let mut tokens = Tokens::new();
        let wiki = tokens.push(TokenKind::WikiLink, "<a>W</a>".into(), "W");
        let math = tokens.push(TokenKind::InlineMath, "<math>m</math>".into(), "$m$");
        let html = format!("<p>{wiki} and {math}</p>");
        assert_eq!(
            tokens.restore(&html),
            "<p><a>W</a> and <span class=\"math math-inline\"><math>m</math></span></p>"
        );
    }

    #[test]
    fn test_block_token_replaces_paragraph() {
        let mut tokens = Tokens::new();
        let block = tokens.push(TokenKind::BlockMath, "<math>b</math>".into(), "$$b$$");
        let html = format!("<p>{block}</p>\n");
        assert_eq!(
            tokens.restore(&html),
            "<div class=\"math math-display\"><math>b</math></div>\n"
        );
    }

    #[test]
    fn test_scrub() {
        assert_eq!(scrub("a\u{E000}b\u{E001}"), "ab");
    }

    #[test]
    fn test_plain_uses_text_stand_ins() {
        let mut tokens = Tokens::new();
        let wiki = tokens.push(TokenKind::WikiLink, "<a class=\"wiki-link\">Plan</a>".into(), "Plan");
        let math = tokens.push(TokenKind::InlineMath, "<math>a</math>".into(), "$a$");
        assert_eq!(tokens.plain(&format!("see {wiki} at /{math}b")), "see Plan at /$a$b");
        assert_eq!(tokens.plain("no tokens"), "no tokens");
    }
}
