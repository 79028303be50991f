//! The preview rendering service.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::cache::RenderCache;
use super::tokens::{self, Segment, Tokens};
use super::types::{CacheEntry, CacheStats, ParsedContent, RenderError, RenderOptions};
use super::{escape_html, frontmatter, math, parser, sanitize, wiki};
use crate::diagram::{self, DiagramRenderer, DiagramResolver, DiagramUpdate};
use crate::highlight::BackgroundMode;

/// Zero-width characters stripped from the start of a document.
const LEADING_ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Markdown to sanitized HTML, with a content-addressed cache.
///
/// One renderer per preview surface; rendering mutates the cache, so the
/// renderer is not shared between threads.
#[derive(Debug)]
pub struct MarkdownRenderer {
    options: RenderOptions,
    mode: BackgroundMode,
    cache: RenderCache,
    diagrams: Option<DiagramResolver>,
}

impl MarkdownRenderer {
    pub fn new(options: RenderOptions) -> Self {
        let cache = RenderCache::new(options.max_cache_size, options.cache_ttl);
        Self {
            mode: options.theme.resolve(),
            options,
            cache,
            diagrams: None,
        }
    }

    /// Render diagram placeholders with `renderer` after each render.
    #[must_use]
    pub fn with_diagram_renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.diagrams = Some(DiagramResolver::new(renderer));
        self
    }

    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `input` to HTML.
    ///
    /// Never fails: a pipeline failure yields an error block, which is not
    /// cached.
    pub fn render(&mut self, input: &str) -> Arc<str> {
        let _scope = crate::perf::scope("render.markdown");
        let normalized = normalize(input);

        let html = if let Some(html) = self.cache.get(&normalized) {
            tracing::debug!(len = normalized.len(), "render cache hit");
            crate::perf::log_event("render.cache", "hit");
            html
        } else {
            crate::perf::log_event("render.cache", format!("miss len={}", normalized.len()));
            match render_guarded(&normalized, &self.options, self.mode) {
                Ok(html) => {
                    let html: Arc<str> = Arc::from(html);
                    self.cache.insert(normalized, Arc::clone(&html));
                    html
                }
                Err(err) => {
                    tracing::warn!(%err, "markdown render failed");
                    Arc::from(error_html(&err))
                }
            }
        };

        if let Some(diagrams) = self.diagrams.as_mut() {
            diagrams.schedule(diagram::placeholder_sources(&html));
        }
        html
    }

    /// Front matter, body and hashtags of `input`.
    pub fn parse_frontmatter(&self, input: &str) -> ParsedContent {
        frontmatter::parse(&normalize(input))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The live cache entry `input` would hit, if any.
    pub fn cache_entry(&self, input: &str) -> Option<&CacheEntry> {
        self.cache.entry(&normalize(input))
    }

    /// Finished diagrams of the latest render, without blocking.
    pub fn diagram_updates(&self) -> Vec<DiagramUpdate> {
        self.diagrams
            .as_ref()
            .map(DiagramResolver::take_updates)
            .unwrap_or_default()
    }

    /// The diagram resolver, when a diagram renderer is attached.
    pub const fn diagram_resolver(&self) -> Option<&DiagramResolver> {
        self.diagrams.as_ref()
    }

    /// Release the cache. Pending diagram results are discarded.
    pub fn dispose(mut self) {
        tracing::debug!(entries = self.cache.len(), "disposing markdown renderer");
        self.cache.clear();
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

/// Strip leading zero-width characters and convert CRLF to LF.
pub fn normalize(input: &str) -> String {
    input
        .trim_start_matches(LEADING_ZERO_WIDTH)
        .replace("\r\n", "\n")
}

fn render_guarded(
    text: &str,
    options: &RenderOptions,
    mode: BackgroundMode,
) -> Result<String, RenderError> {
    catch_unwind(AssertUnwindSafe(|| render_uncached(text, options, mode))).unwrap_or_else(
        |payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(RenderError::Panicked(message))
        },
    )
}

/// Run the pipeline on normalized text, bypassing the cache.
///
/// # Errors
///
/// Returns an error if the document cannot be turned into HTML.
pub fn render_uncached(
    text: &str,
    options: &RenderOptions,
    mode: BackgroundMode,
) -> Result<String, RenderError> {
    let body = if options.strip_frontmatter {
        frontmatter::strip(text)
    } else {
        text
    };
    let body = tokens::scrub(body);

    let mut tokens = Tokens::new();
    let mut prepared = String::with_capacity(body.len());
    for segment in tokens::segments(&body) {
        match segment {
            Segment::Code(code) => prepared.push_str(code),
            Segment::Prose(prose) => {
                let prose = math::extract(prose, &mut tokens);
                prepared.push_str(&wiki::extract(&prose, &mut tokens));
            }
        }
    }

    if !tokens.is_empty() {
        tracing::debug!(tokens = tokens.len(), "parked math and wiki fragments");
    }
    let html = parser::markdown_to_html_with_tokens(&prepared, mode, &tokens)?;
    let html = tokens.restore(&html);
    Ok(sanitize::sanitize(&html))
}

/// Placeholder shown in place of a preview that failed to render.
pub fn error_html(err: &RenderError) -> String {
    format!(
        "<div class=\"render-error\">Failed to render preview: {}</div>",
        escape_html(&err.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::ThemePreference;

    fn renderer() -> MarkdownRenderer {
        MarkdownRenderer::new(RenderOptions {
            theme: ThemePreference::Dark,
            ..RenderOptions::default()
        })
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\u{FEFF}\u{200B}a\r\nb"), "a\nb");
        assert_eq!(normalize("a\u{200B}"), "a\u{200B}");
    }

    #[test]
    fn test_render_caches_result() {
        let mut renderer = renderer();
        let first = renderer.render("# Title\n\nbody");
        let stamp = renderer.cache_entry("# Title\n\nbody").unwrap().timestamp;
        let second = renderer.render("# Title\n\nbody");

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(renderer.stats().cache_size, 1);
        assert_eq!(renderer.cache_entry("# Title\n\nbody").unwrap().timestamp, stamp);
    }

    #[test]
    fn test_normalized_inputs_share_an_entry() {
        let mut renderer = renderer();
        renderer.render("a\r\nb");
        renderer.render("\u{FEFF}a\nb");
        assert_eq!(renderer.stats().cache_size, 1);
    }

    #[test]
    fn test_frontmatter_stripped_by_default() {
        let mut renderer = renderer();
        let html = renderer.render("---\ntitle: X\n---\nHello");
        assert_eq!(&*html, "<p>Hello</p>\n");
    }

    #[test]
    fn test_frontmatter_kept_when_configured() {
        let mut renderer = MarkdownRenderer::new(RenderOptions {
            strip_frontmatter: false,
            ..RenderOptions::default()
        });
        let html = renderer.render("---\ntitle: X\n---\nHello");
        assert!(html.contains("title: X"));
    }

    #[test]
    fn test_math_and_wiki_links_in_prose_only() {
        let mut renderer = renderer();
        let html = renderer.render("$x$ and [[Plan]] but `$y$` and `[[No]]`");
        assert!(html.contains("<math"));
        assert!(html.contains("data-wiki-target=\"Plan\""));
        assert!(html.contains("<code>$y$</code>"));
        assert!(html.contains("<code>[[No]]</code>"));
    }

    #[test]
    fn test_failure_renders_error_block_uncached() {
        let mut renderer = renderer();
        let deep = ">".repeat(parser::MAX_DEPTH + 5);
        let html = renderer.render(&deep);
        assert!(html.starts_with("<div class=\"render-error\">Failed to render preview: "));
        assert_eq!(renderer.stats().cache_size, 0);
    }

    #[test]
    fn test_clear_and_dispose() {
        let mut renderer = renderer();
        renderer.render("a");
        renderer.clear_cache();
        assert_eq!(renderer.stats().cache_size, 0);
        renderer.render("b");
        renderer.dispose();
    }

    #[test]
    fn test_parse_frontmatter_normalizes() {
        let parsed = renderer().parse_frontmatter("\u{FEFF}---\r\ntitle: X\r\n---\r\nBody");
        assert_eq!(parsed.body, "Body");
        assert_eq!(parsed.frontmatter["title"].as_str(), Some("X"));
    }

    #[test]
    fn test_wiki_link_in_image_alt_is_plain_text() {
        let mut renderer = renderer();
        let html = renderer.render("![see [[Plan]]](a.png)");
        assert_eq!(&*html, "<p><img src=\"a.png\" alt=\"see Plan\" loading=\"lazy\"></p>\n");
    }

    #[test]
    fn test_math_in_link_url_keeps_source() {
        let mut renderer = renderer();
        let html = renderer.render("[link](https://x.io/$a$b)");
        assert!(html.contains(
            "<a href=\"https://x.io/$a$b\" target=\"_blank\" rel=\"noopener noreferrer\">link</a>"
        ));
        assert!(!html.contains("<math"));
    }

    #[test]
    fn test_scrubbed_sentinels_do_not_inject() {
        let mut renderer = renderer();
        let html = renderer.render("x \u{E000}W0\u{E001} y");
        assert_eq!(&*html, "<p>x W0 y</p>\n");
    }
}
