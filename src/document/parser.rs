//! Markdown parsing with comrak and HTML generation.
//!
//! comrak builds the GFM syntax tree; the HTML is produced here so every
//! block gets the preview's own markup (classes, heading anchors, highlighted
//! code, diagram placeholders).

use std::collections::HashMap;

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};

use super::tokens::Tokens;
use super::types::RenderError;
use crate::diagram;
use crate::highlight::{self, BackgroundMode};

/// Deepest block/inline nesting rendered before giving up.
pub const MAX_DEPTH: usize = 128;

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render markdown `source` to (unsanitized) HTML.
///
/// # Errors
///
/// Returns [`RenderError::TooDeep`] if the document nests deeper than
/// [`MAX_DEPTH`].
pub fn markdown_to_html(source: &str, mode: BackgroundMode) -> Result<String, RenderError> {
    markdown_to_html_with_tokens(source, mode, &Tokens::new())
}

/// Like [`markdown_to_html`], for source carrying parked `tokens`. Tokens
/// that end up in attribute values are replaced by their plain text there.
pub(crate) fn markdown_to_html_with_tokens(
    source: &str,
    mode: BackgroundMode,
    tokens: &Tokens,
) -> Result<String, RenderError> {
    let arena = Arena::new();
    let mut options = Options::default();
    configure(&mut options);
    let root = {
        let _scope = crate::perf::scope("document.parse");
        parse_document(&arena, source, &options)
    };

    let _scope = crate::perf::scope("document.html");
    let mut writer = HtmlWriter::new(mode, tokens);
    writer.children(root, 0, false)?;
    Ok(writer.finish())
}

fn configure(options: &mut Options) {
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.superscript = true;
}

struct HtmlWriter<'t> {
    out: String,
    mode: BackgroundMode,
    tokens: &'t Tokens,
    slugs: HashMap<String, usize>,
    /// Footnote number by name, in order of first reference.
    footnote_numbers: HashMap<String, usize>,
    footnote_refs: HashMap<String, usize>,
    /// Rendered definitions: (number, name, html).
    footnotes: Vec<(usize, String, String)>,
}

impl<'t> HtmlWriter<'t> {
    fn new(mode: BackgroundMode, tokens: &'t Tokens) -> Self {
        Self {
            out: String::new(),
            mode,
            tokens,
            slugs: HashMap::new(),
            footnote_numbers: HashMap::new(),
            footnote_refs: HashMap::new(),
            footnotes: Vec::new(),
        }
    }

    fn finish(mut self) -> String {
        if self.footnotes.is_empty() {
            return self.out;
        }
        self.footnotes.sort_by_key(|(number, _, _)| *number);
        self.out.push_str("<section class=\"footnotes\">\n<ol>\n");
        for (_, name, html) in &self.footnotes {
            let name = escape_html(&self.tokens.plain(name));
            self.out.push_str(&format!(
                "<li id=\"fn-{name}\">\n{html}<a href=\"#fnref-{name}\" class=\"footnote-backref\">↩</a>\n</li>\n"
            ));
        }
        self.out.push_str("</ol>\n</section>\n");
        self.out
    }

    fn children<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        depth: usize,
        tight: bool,
    ) -> Result<(), RenderError> {
        for child in node.children() {
            self.node(child, depth + 1, tight)?;
        }
        Ok(())
    }

    fn node<'a>(&mut self, node: &'a AstNode<'a>, depth: usize, tight: bool) -> Result<(), RenderError> {
        if depth > MAX_DEPTH {
            return Err(RenderError::TooDeep(MAX_DEPTH));
        }

        match &node.data.borrow().value {
            NodeValue::Document => self.children(node, depth, false)?,
            NodeValue::FrontMatter(_) => {}
            NodeValue::Paragraph => {
                if tight {
                    self.children(node, depth, false)?;
                } else {
                    self.out.push_str("<p>");
                    self.children(node, depth, false)?;
                    self.out.push_str("</p>\n");
                }
            }
            NodeValue::Heading(heading) => {
                let slug = self.slug(&collect_text(node));
                let level = heading.level;
                self.out.push_str(&format!(
                    "<h{level} id=\"{slug}\"><a class=\"anchor\" href=\"#{slug}\" aria-hidden=\"true\">#</a>"
                ));
                self.children(node, depth, false)?;
                self.out.push_str(&format!("</h{level}>\n"));
            }
            NodeValue::BlockQuote => {
                self.out.push_str("<blockquote class=\"md-blockquote\">\n");
                self.children(node, depth, false)?;
                self.out.push_str("</blockquote>\n");
            }
            NodeValue::List(list) => {
                let task_list = node
                    .children()
                    .any(|child| matches!(child.data.borrow().value, NodeValue::TaskItem(_)));
                let class = if task_list { " class=\"task-list\"" } else { "" };
                let tag = match list.list_type {
                    ListType::Bullet => {
                        self.out.push_str(&format!("<ul{class}>\n"));
                        "ul"
                    }
                    ListType::Ordered => {
                        if list.start == 1 {
                            self.out.push_str(&format!("<ol{class}>\n"));
                        } else {
                            self.out
                                .push_str(&format!("<ol start=\"{}\"{class}>\n", list.start));
                        }
                        "ol"
                    }
                };
                self.children(node, depth, list.tight)?;
                self.out.push_str(&format!("</{tag}>\n"));
            }
            NodeValue::Item(_) => {
                self.out.push_str("<li>");
                self.children(node, depth, tight)?;
                self.out.push_str("</li>\n");
            }
            NodeValue::TaskItem(symbol) => {
                let checked = if symbol.is_some() { " checked" } else { "" };
                self.out.push_str(&format!(
                    "<li class=\"task-list-item\"><input type=\"checkbox\" disabled{checked}> "
                ));
                self.children(node, depth, tight)?;
                self.out.push_str("</li>\n");
            }
            NodeValue::CodeBlock(block) => {
                let language = block.info.split_whitespace().next().unwrap_or("");
                self.code_block(language, &block.literal);
            }
            NodeValue::HtmlBlock(block) => self.out.push_str(&block.literal),
            NodeValue::HtmlInline(html) => self.out.push_str(html),
            NodeValue::ThematicBreak => self.out.push_str("<hr>\n"),
            NodeValue::Table(table) => {
                let alignments = table.alignments.clone();
                self.table(node, depth, &alignments)?;
            }
            NodeValue::Text(text) => self.out.push_str(&escape_html(text)),
            NodeValue::Code(code) => {
                self.out.push_str("<code>");
                self.out.push_str(&escape_html(&code.literal));
                self.out.push_str("</code>");
            }
            NodeValue::Emph => self.wrap(node, depth, "em")?,
            NodeValue::Strong => self.wrap(node, depth, "strong")?,
            NodeValue::Strikethrough => self.wrap(node, depth, "del")?,
            NodeValue::Superscript => self.wrap(node, depth, "sup")?,
            NodeValue::Link(link) => {
                let target = if link.url.starts_with('#') {
                    ""
                } else {
                    " target=\"_blank\" rel=\"noopener noreferrer\""
                };
                let href = self.attr(&link.url);
                self.out.push_str(&format!("<a href=\"{href}\""));
                if !link.title.is_empty() {
                    let title = self.attr(&link.title);
                    self.out.push_str(&format!(" title=\"{title}\""));
                }
                self.out.push_str(&format!("{target}>"));
                self.children(node, depth, false)?;
                self.out.push_str("</a>");
            }
            NodeValue::Image(link) => {
                let src = self.attr(&link.url);
                let alt = self.attr(&collect_text(node));
                self.out
                    .push_str(&format!("<img src=\"{src}\" alt=\"{alt}\""));
                if !link.title.is_empty() {
                    let title = self.attr(&link.title);
                    self.out.push_str(&format!(" title=\"{title}\""));
                }
                self.out.push_str(" loading=\"lazy\">");
            }
            NodeValue::SoftBreak | NodeValue::LineBreak => self.out.push_str("<br>\n"),
            NodeValue::FootnoteReference(reference) => self.footnote_ref(&reference.name),
            NodeValue::FootnoteDefinition(definition) => {
                let name = definition.name.clone();
                let number = self.footnote_number(&name);
                let outer = std::mem::take(&mut self.out);
                let result = self.children(node, depth, false);
                let html = std::mem::replace(&mut self.out, outer);
                result?;
                self.footnotes.push((number, name, html));
            }
            _ => self.children(node, depth, false)?,
        }
        Ok(())
    }

    fn wrap<'a>(&mut self, node: &'a AstNode<'a>, depth: usize, tag: &str) -> Result<(), RenderError> {
        self.out.push_str(&format!("<{tag}>"));
        self.children(node, depth, false)?;
        self.out.push_str(&format!("</{tag}>"));
        Ok(())
    }

    fn code_block(&mut self, language: &str, literal: &str) {
        if language.eq_ignore_ascii_case("mermaid") {
            self.out.push_str(&diagram::placeholder(literal.trim_end()));
            self.out.push('\n');
            return;
        }
        if let Some(highlighted) = highlight::highlight_html(language, literal, self.mode) {
            self.out.push_str(&format!(
                "<pre class=\"code-block\"><code class=\"language-{}\">{highlighted}</code></pre>\n",
                escape_html(language)
            ));
            return;
        }
        if language.is_empty() {
            self.out.push_str("<pre><code>");
        } else {
            self.out.push_str(&format!(
                "<pre><code class=\"language-{}\">",
                escape_html(language)
            ));
        }
        self.out.push_str(&escape_html(literal));
        self.out.push_str("</code></pre>\n");
    }

    fn table<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        depth: usize,
        alignments: &[TableAlignment],
    ) -> Result<(), RenderError> {
        self.out.push_str("<table class=\"md-table\">\n");
        let mut in_body = false;
        for row in node.children() {
            let header = match row.data.borrow().value {
                NodeValue::TableRow(header) => header,
                _ => continue,
            };
            if header {
                self.out.push_str("<thead>\n");
            } else if !in_body {
                self.out.push_str("<tbody>\n");
                in_body = true;
            }

            self.out.push_str("<tr>");
            let tag = if header { "th" } else { "td" };
            for (column, cell) in row.children().enumerate() {
                let align = match alignments.get(column) {
                    Some(TableAlignment::Left) => " align=\"left\"",
                    Some(TableAlignment::Center) => " align=\"center\"",
                    Some(TableAlignment::Right) => " align=\"right\"",
                    _ => "",
                };
                self.out
                    .push_str(&format!("<{tag} class=\"md-cell\"{align}>"));
                self.children(cell, depth + 1, false)?;
                self.out.push_str(&format!("</{tag}>"));
            }
            self.out.push_str("</tr>\n");

            if header {
                self.out.push_str("</thead>\n");
            }
        }
        if in_body {
            self.out.push_str("</tbody>\n");
        }
        self.out.push_str("</table>\n");
        Ok(())
    }

    fn footnote_number(&mut self, name: &str) -> usize {
        let next = self.footnote_numbers.len() + 1;
        *self
            .footnote_numbers
            .entry(name.to_string())
            .or_insert(next)
    }

    fn footnote_ref(&mut self, name: &str) {
        let number = self.footnote_number(name);
        let anchor = self.attr(name);
        let count = self.footnote_refs.entry(name.to_string()).or_insert(0);
        *count += 1;
        let id = if *count == 1 {
            format!("fnref-{anchor}")
        } else {
            format!("fnref-{anchor}-{count}")
        };
        self.out.push_str(&format!(
            "<sup class=\"footnote-ref\"><a href=\"#fn-{anchor}\" id=\"{id}\">{number}</a></sup>"
        ));
    }

    /// Attribute-safe text: tokens become plain text, then it is escaped.
    fn attr(&self, value: &str) -> String {
        escape_html(&self.tokens.plain(value))
    }

    /// GitHub-style heading id, deduplicated with `-1`, `-2`, ...
    fn slug(&mut self, text: &str) -> String {
        let base = slugify(&self.tokens.plain(text));
        let seen = self.slugs.entry(base.clone()).or_insert(0);
        let slug = if *seen == 0 {
            base
        } else {
            format!("{base}-{seen}")
        };
        *seen += 1;
        slug
    }
}

fn slugify(text: &str) -> String {
    let slug: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|ch| match ch {
            ' ' => Some('-'),
            '-' | '_' => Some(ch),
            _ if ch.is_alphanumeric() => Some(ch),
            _ => None,
        })
        .collect();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text
}
