//! Markdown preview rendering.
//!
//! This module handles:
//! - Normalizing input and caching rendered HTML by content
//! - Front matter and hashtag extraction
//! - Math (MathML) and wiki links outside code
//! - Parsing with comrak and emitting preview HTML
//! - Sanitizing the result with ammonia

mod cache;
mod frontmatter;
mod math;
mod parser;
mod renderer;
mod sanitize;
mod tokens;
mod types;
mod wiki;

pub use cache::{RenderCache, content_hash};
pub use frontmatter::{hashtags, parse as parse_content, strip as strip_frontmatter};
pub use parser::{MAX_DEPTH, escape_html, markdown_to_html};
pub use renderer::{MarkdownRenderer, error_html, normalize, render_uncached};
pub use sanitize::sanitize;
pub use types::{
    CacheEntry, CacheStats, DEFAULT_CACHE_TTL, DEFAULT_MAX_CACHE_SIZE, FrontmatterValue,
    ParsedContent, RenderError, RenderOptions,
};
pub use wiki::{link_html as wiki_link_html, targets as wiki_targets};
