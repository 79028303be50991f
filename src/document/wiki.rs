//! `[[Title]]` and `[[Title|Label]]` links between notes.
//!
//! Targets are only annotated; resolving a title to a note is up to the host.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::escape_html;
use super::tokens::{TokenKind, Tokens};

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|\n]+)(?:\|([^\[\]\n]+))?\]\]").expect("valid wiki link regex")
});

/// Replace wiki links in a prose segment with tokens.
pub fn extract(prose: &str, tokens: &mut Tokens) -> String {
    WIKI_LINK
        .replace_all(prose, |caps: &Captures<'_>| {
            let target = caps[1].trim();
            let label = caps.get(2).map_or(target, |m| m.as_str().trim());
            if target.is_empty() {
                return caps[0].to_string();
            }
            let label = if label.is_empty() { target } else { label };
            tokens.push(TokenKind::WikiLink, link_html(target, label), label)
        })
        .into_owned()
}

pub fn link_html(target: &str, label: &str) -> String {
    let label = if label.is_empty() { target } else { label };
    format!(
        "<a class=\"wiki-link\" data-wiki-target=\"{}\">{}</a>",
        escape_html(target),
        escape_html(label)
    )
}

/// Titles referenced by wiki links outside code.
pub fn targets(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for segment in super::tokens::segments(text) {
        let super::tokens::Segment::Prose(prose) = segment else {
            continue;
        };
        for caps in WIKI_LINK.captures_iter(prose) {
            let target = caps[1].trim();
            if !target.is_empty() && !found.iter().any(|t| t == target) {
                found.push(target.to_string());
            }
        }
    }
    found
}
