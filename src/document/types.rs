//! Core rendering types.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::highlight::ThemePreference;

/// Default number of cached renders.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 50;
/// Default lifetime of a cached render.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// A front-matter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl FrontmatterValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A document split into metadata and body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedContent {
    /// Content after the front-matter block.
    pub body: String,
    pub frontmatter: BTreeMap<String, FrontmatterValue>,
    /// `#tag` names found in the body, without the `#`.
    pub hashtags: BTreeSet<String>,
}

/// Settings for a [`MarkdownRenderer`](super::MarkdownRenderer).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub max_cache_size: usize,
    pub cache_ttl: Duration,
    /// Drop a leading front-matter block from the preview.
    pub strip_frontmatter: bool,
    /// Code-block highlight theme.
    pub theme: ThemePreference,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            cache_ttl: DEFAULT_CACHE_TTL,
            strip_frontmatter: true,
            theme: ThemePreference::Auto,
        }
    }
}

/// A cached render.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub html: Arc<str>,
    /// Normalized source the HTML was rendered from.
    pub source: String,
    pub timestamp: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_size: usize,
    pub max_cache_size: usize,
    pub cache_timeout: Duration,
}

/// Whole-pipeline failures; rendered as an error block, never cached.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("document nesting exceeds {0} levels")]
    TooDeep(usize),
    #[error("renderer panicked: {0}")]
    Panicked(String),
}
