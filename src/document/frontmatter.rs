//! Front-matter and hashtag extraction.
//!
//! Front matter is a leading `---` fenced block of `key: value` lines. Only
//! the small subset of YAML that notes use is understood: scalars, quoted
//! strings, booleans, numbers and flow lists.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use super::types::{FrontmatterValue, ParsedContent};

const FENCE: &str = "---";

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}_-]+)").expect("valid hashtag regex")
});

/// Split `text` into its front-matter block (without fences) and the body.
///
/// Returns `None` when there is no leading block or it is never closed.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(FENCE)?;
    let rest = rest.strip_prefix('\n')?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((block.strip_suffix('\n').unwrap_or(block), body));
        }
        offset += line.len();
    }
    None
}

/// Body with any leading front-matter block removed.
pub fn strip(text: &str) -> &str {
    split(text).map_or(text, |(_, body)| body)
}

/// Parse metadata, body and hashtags of a (normalized) document.
pub fn parse(text: &str) -> ParsedContent {
    let (frontmatter, body) = match split(text) {
        Some((block, body)) => (parse_block(block), body.trim_start_matches('\n')),
        None => (BTreeMap::new(), text),
    };
    ParsedContent {
        hashtags: hashtags(body),
        frontmatter,
        body: body.to_string(),
    }
}

/// Parse `key: value` lines; lines without a key are skipped.
pub fn parse_block(block: &str) -> BTreeMap<String, FrontmatterValue> {
    let mut map = BTreeMap::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            tracing::debug!(line, "skipping front-matter line without a colon");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), parse_value(value.trim()));
    }
    map
}

fn parse_value(raw: &str) -> FrontmatterValue {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|item| unquote(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect();
        return FrontmatterValue::List(items);
    }
    if raw.eq_ignore_ascii_case("true") {
        return FrontmatterValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return FrontmatterValue::Bool(false);
    }
    if is_quoted(raw) {
        return FrontmatterValue::String(unquote(raw).to_string());
    }
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => FrontmatterValue::Number(number),
        _ => FrontmatterValue::String(raw.to_string()),
    }
}

fn is_quoted(raw: &str) -> bool {
    raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')))
}

fn unquote(raw: &str) -> &str {
    if is_quoted(raw) {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// `#tag` tokens outside fenced code, preceded by whitespace or line start.
pub fn hashtags(body: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    let mut fence: Option<String> = None;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if let Some(open) = &fence {
            if trimmed.starts_with(open.as_str()) {
                fence = None;
            }
            continue;
        }
        if let Some(marker) = fence_marker(trimmed) {
            fence = Some(marker);
            continue;
        }
        for caps in HASHTAG.captures_iter(line) {
            tags.insert(caps[1].to_string());
        }
    }
    tags
}

/// Opening fence run (```` ``` ```` or `~~~`, three or more).
pub(crate) fn fence_marker(trimmed: &str) -> Option<String> {
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then(|| ch.to_string().repeat(len))
}
