//! Asynchronous diagram post-pass.
//!
//! Rendered previews carry `<mermaid-diagram data-source="…">` placeholders
//! (source base64-encoded). When a host supplies a [`DiagramRenderer`], each
//! batch of placeholders is rendered on a background thread and the results
//! are delivered over a channel the host polls.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, LazyLock};
use std::thread;

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

use crate::document::escape_html;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<mermaid-diagram data-source="([A-Za-z0-9+/=]*)">\s*</mermaid-diagram>"#)
        .expect("valid diagram placeholder regex")
});

/// Renders diagram source to an HTML/SVG fragment.
pub trait DiagramRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the diagram source cannot be rendered.
    fn render(&self, source: &str) -> Result<String>;
}

impl<F> DiagramRenderer for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn render(&self, source: &str) -> Result<String> {
        self(source)
    }
}

/// One finished diagram of a scheduled batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramUpdate {
    /// Batch the diagram belongs to; newer batches supersede older ones.
    pub generation: u64,
    /// Position of the placeholder in the rendered HTML.
    pub index: usize,
    pub source: String,
    /// Rendered fragment, or an escaped error block when `failed`.
    pub html: String,
    pub failed: bool,
}

/// Placeholder element for a diagram code block.
pub fn placeholder(source: &str) -> String {
    format!(
        "<mermaid-diagram data-source=\"{}\"></mermaid-diagram>",
        STANDARD.encode(source)
    )
}

/// Decoded sources of every placeholder in `html`, in document order.
///
/// Placeholders whose payload does not decode are reported as empty sources
/// so indices stay aligned with the HTML.
pub fn placeholder_sources(html: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(html)
        .map(|caps| {
            STANDARD
                .decode(&caps[1])
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .unwrap_or_default()
        })
        .collect()
}

/// Replace the `update.index`-th placeholder in `html` with the update's
/// fragment. Returns `html` unchanged if there is no such placeholder.
pub fn apply_diagram_update(html: &str, update: &DiagramUpdate) -> String {
    let Some(found) = PLACEHOLDER.find_iter(html).nth(update.index) else {
        return html.to_string();
    };
    let mut out = String::with_capacity(html.len() + update.html.len());
    out.push_str(&html[..found.start()]);
    out.push_str(&update.html);
    out.push_str(&html[found.end()..]);
    out
}

fn error_block(source: &str) -> String {
    format!(
        "<pre class=\"diagram-error\"><code>{}</code></pre>",
        escape_html(source)
    )
}

/// Schedules diagram batches and collects their results.
pub struct DiagramResolver {
    renderer: Arc<dyn DiagramRenderer>,
    tx: Sender<DiagramUpdate>,
    rx: Receiver<DiagramUpdate>,
    generation: u64,
}

impl std::fmt::Debug for DiagramResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramResolver")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl DiagramResolver {
    pub fn new(renderer: Arc<dyn DiagramRenderer>) -> Self {
        let (tx, rx) = channel();
        Self {
            renderer,
            tx,
            rx,
            generation: 0,
        }
    }

    /// Current batch generation.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Render `sources` on a worker thread as a new generation.
    pub fn schedule(&mut self, sources: Vec<String>) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        if sources.is_empty() {
            return generation;
        }

        let renderer = Arc::clone(&self.renderer);
        let tx = self.tx.clone();
        tracing::debug!(generation, count = sources.len(), "scheduling diagram batch");
        thread::spawn(move || {
            for (index, source) in sources.into_iter().enumerate() {
                let rendered = catch_unwind(AssertUnwindSafe(|| renderer.render(&source)));
                let (html, failed) = match rendered {
                    Ok(Ok(html)) => (html, false),
                    Ok(Err(err)) => {
                        tracing::debug!(%err, index, "diagram render failed");
                        (error_block(&source), true)
                    }
                    Err(_) => {
                        tracing::warn!(index, "diagram renderer panicked");
                        (error_block(&source), true)
                    }
                };
                let update = DiagramUpdate {
                    generation,
                    index,
                    source,
                    html,
                    failed,
                };
                if tx.send(update).is_err() {
                    return;
                }
            }
        });
        generation
    }

    /// Drain finished diagrams of the current generation without blocking.
    pub fn take_updates(&self) -> Vec<DiagramUpdate> {
        self.rx
            .try_iter()
            .filter(|update| update.generation == self.generation)
            .collect()
    }

    /// Block until `count` updates of the current generation arrived, or the
    /// timeout passed. Intended for tests and headless hosts.
    pub fn wait_for(&self, count: usize, timeout: std::time::Duration) -> Vec<DiagramUpdate> {
        let deadline = std::time::Instant::now() + timeout;
        let mut updates = Vec::new();
        while updates.len() < count {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(update) if update.generation == self.generation => updates.push(update),
                Ok(_) => {}
                Err(_) => break,
            }
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn upper() -> Arc<dyn DiagramRenderer> {
        Arc::new(|source: &str| -> Result<String> {
            if source.contains("bad") {
                anyhow::bail!("parse error");
            }
            Ok(format!("<svg>{}</svg>", source.to_uppercase()))
        })
    }

    #[test]
    fn test_placeholder_round_trips_source() {
        let html = format!("<p>x</p>{}", placeholder("graph TD\nA-->B"));
        assert_eq!(placeholder_sources(&html), vec!["graph TD\nA-->B"]);
    }

    #[test]
    fn test_apply_update_replaces_nth_placeholder() {
        let html = format!("{}{}", placeholder("a"), placeholder("b"));
        let update = DiagramUpdate {
            generation: 1,
            index: 1,
            source: "b".into(),
            html: "<svg>B</svg>".into(),
            failed: false,
        };
        let out = apply_diagram_update(&html, &update);
        assert!(out.starts_with(&placeholder("a")));
        assert!(out.ends_with("<svg>B</svg>"));
    }

    #[test]
    fn test_apply_update_missing_index_is_noop() {
        let html = placeholder("a");
        let update = DiagramUpdate {
            generation: 1,
            index: 3,
            source: String::new(),
            html: String::new(),
            failed: false,
        };
        assert_eq!(apply_diagram_update(&html, &update), html);
    }

    #[test]
    fn test_resolver_renders_batch() {
        let mut resolver = DiagramResolver::new(upper());
        let generation = resolver.schedule(vec!["a".into(), "bad <x>".into()]);
        let mut updates = resolver.wait_for(2, Duration::from_secs(5));
        updates.sort_by_key(|u| u.index);

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].generation, generation);
        assert_eq!(updates[0].html, "<svg>A</svg>");
        assert!(!updates[0].failed);
        assert!(updates[1].failed);
        assert_eq!(
            updates[1].html,
            "<pre class=\"diagram-error\"><code>bad &lt;x&gt;</code></pre>"
        );
    }

    #[test]
    fn test_newer_generation_drops_stale_updates() {
        let mut resolver = DiagramResolver::new(upper());
        resolver.schedule(vec!["old".into()]);
        let current = resolver.schedule(vec!["new".into()]);
        let updates = resolver.wait_for(1, Duration::from_secs(5));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].generation, current);
        assert_eq!(updates[0].source, "new");
    }

    #[test]
    fn test_panicking_renderer_reports_failure() {
        let renderer: Arc<dyn DiagramRenderer> =
            Arc::new(|_: &str| -> Result<String> { panic!("boom") });
        let mut resolver = DiagramResolver::new(renderer);
        resolver.schedule(vec!["x".into()]);
        let updates = resolver.wait_for(1, Duration::from_secs(5));
        assert_eq!(updates.len(), 1);
        assert!(updates[0].failed);
    }
}
