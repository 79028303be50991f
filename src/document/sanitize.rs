//! Allow-list HTML sanitization with ammonia.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::Builder;

const TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "dd", "del", "details", "div", "dl", "dt",
    "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input", "kbd", "li", "mark",
    "ol", "p", "pre", "q", "s", "section", "small", "span", "strong", "sub", "summary", "sup",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul", "mermaid-diagram",
];

const MATHML_TAGS: &[&str] = &[
    "math", "mi", "mn", "mo", "ms", "mtext", "mspace", "mrow", "mfrac", "msqrt", "mroot",
    "msub", "msup", "msubsup", "munder", "mover", "munderover", "mtable", "mtr", "mtd",
    "mstyle", "mpadded", "mphantom", "menclose", "semantics", "annotation",
];

const MATHML_ATTRIBUTES: &[&str] = &[
    "xmlns", "display", "mathvariant", "stretchy", "fence", "separator", "lspace", "rspace",
    "accent", "accentunder", "linethickness", "columnalign", "displaystyle", "scriptlevel",
    "width", "height", "depth", "notation", "movablelimits", "symmetric", "form", "largeop",
    "encoding",
];

const GENERIC_ATTRIBUTES: &[&str] = &["class", "id", "title", "lang", "aria-hidden"];

static SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(build);

fn build() -> Builder<'static> {
    let mut tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
    let mut allow = |tag: &'static str, attrs: &[&'static str]| {
        tag_attributes
            .entry(tag)
            .or_default()
            .extend(attrs.iter().copied());
    };
    allow("a", &["href", "target", "rel", "data-wiki-target"]);
    allow("img", &["src", "alt", "loading", "width", "height"]);
    allow("input", &["type", "checked", "disabled"]);
    allow("ol", &["start"]);
    allow("td", &["align"]);
    allow("th", &["align"]);
    allow("span", &["style"]);
    allow("details", &["open"]);
    allow("mermaid-diagram", &["data-source"]);
    for &tag in MATHML_TAGS {
        allow(tag, MATHML_ATTRIBUTES);
    }

    let mut builder = Builder::default();
    builder
        .tags(TAGS.iter().chain(MATHML_TAGS).copied().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(GENERIC_ATTRIBUTES.iter().copied().collect())
        .link_rel(None)
        .strip_comments(true);
    builder
}

/// Strip everything outside the preview's allow-list.
pub fn sanitize(html: &str) -> String {
    let _scope = crate::perf::scope("document.sanitize");
    SANITIZER.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_removed() {
        let out = sanitize("<p>hi</p><script>alert(1)</script>");
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn test_event_handlers_removed() {
        let out = sanitize("<img src=\"a.png\" onerror=\"x()\" loading=\"lazy\">");
        assert!(!out.contains("onerror"));
        assert!(out.contains("loading=\"lazy\""));
    }

    #[test]
    fn test_javascript_urls_removed() {
        let out = sanitize("<a href=\"javascript:alert(1)\">x</a>");
        assert!(!out.contains("javascript"));
    }

    #[test]
    fn test_rel_kept_only_where_emitted() {
        let out = sanitize(
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">x</a>",
        );
        assert!(out.contains("rel=\"noopener noreferrer\""));
        assert!(out.contains("target=\"_blank\""));

        let out = sanitize("<a class=\"wiki-link\" data-wiki-target=\"Plan\">Plan</a>");
        assert!(!out.contains("rel="));
        let out = sanitize("<a class=\"anchor\" href=\"#top\" aria-hidden=\"true\">#</a>");
        assert!(!out.contains("rel="));
    }

    #[test]
    fn test_custom_markup_survives() {
        let html = "<mermaid-diagram data-source=\"Z3JhcGg=\"></mermaid-diagram>\
                    <a class=\"wiki-link\" data-wiki-target=\"Plan\">Plan</a>\
                    <input type=\"checkbox\" disabled=\"\">\
                    <span style=\"color:#ff0000\">x</span>";
        let out = sanitize(html);
        assert!(out.contains("<mermaid-diagram data-source=\"Z3JhcGg=\"></mermaid-diagram>"));
        assert!(out.contains("data-wiki-target=\"Plan\""));
        assert!(out.contains("type=\"checkbox\""));
        assert!(out.contains("style=\"color:#ff0000\""));
    }

    #[test]
    fn test_mathml_survives() {
        let out = sanitize("<span class=\"math\"><math display=\"inline\"><mi>x</mi></math></span>");
        assert!(out.contains("<math"));
        assert!(out.contains("<mi>x</mi>"));
    }

    #[test]
    fn test_style_not_allowed_on_other_tags() {
        let out = sanitize("<p style=\"position:fixed\">x</p>");
        assert_eq!(out, "<p>x</p>");
    }
}
