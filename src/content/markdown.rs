//! Markdown rendering into a structured node tree
//!
//! Bodies are rendered to a small element tree rather than an HTML string so
//! page handlers can ship structured page data. Two transformations happen
//! here and nowhere else: headings are pushed down by [`HEADING_OFFSET`]
//! levels (the page chrome owns h1/h2), and tables are wrapped in a
//! horizontally scrolling container.

use indexmap::IndexMap;
use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

use super::frontmatter::Authors;

/// Levels added to every source heading
pub const HEADING_OFFSET: u8 = 2;

/// Deepest heading level that can be represented
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Class on the wrapper placed around every table
pub const TABLE_WRAPPER_CLASS: &str = "table-scroll";

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Map a source heading level to the rendered one
pub fn remap_heading_level(level: u8) -> u8 {
    level.saturating_add(HEADING_OFFSET).min(MAX_HEADING_LEVEL)
}

/// A node in the rendered tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Element(Element),
    Text { value: String },
    /// Raw HTML or JSX passed through from the source
    Html { value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: &'static str,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Concatenated text of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

/// A heading found in rendered content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingEntry {
    pub level: u8,
    pub id: Option<String>,
    pub text: String,
}

/// Structured output of rendering a document body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedContent {
    pub nodes: Vec<Node>,
}

impl RenderedContent {
    /// All headings in document order, with their rendered levels
    pub fn headings(&self) -> Vec<HeadingEntry> {
        let mut out = Vec::new();
        collect_headings(&self.nodes, &mut out);
        out
    }

    /// Serialize the tree as HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(&mut out, node);
        }
        out
    }
}

/// Markdown renderer producing [`RenderedContent`]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        // Front-matter is split off before rendering, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        Self { options }
    }

    /// Render a markdown body.
    ///
    /// Never fails: syntax the parser cannot make sense of comes through as
    /// literal text.
    pub fn render(&self, markdown: &str) -> RenderedContent {
        let parser = Parser::new_ext(markdown, self.options);

        let mut builder = TreeBuilder::default();
        for event in parser {
            builder.push(event);
        }
        builder.finish()
    }

    /// Join author names for display: "A", "A & B", "A, B & C"
    pub fn format_authors(authors: &Authors) -> String {
        let names: Vec<&str> = authors
            .as_slice()
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();

        match names.as_slice() {
            [] => String::new(),
            [only] => only.to_string(),
            [rest @ .., last] => format!("{} & {}", rest.join(", "), last),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the node tree from a flat event stream
#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Element>,
    /// Number of elements opened by each pending start tag
    spans: Vec<usize>,
    alignments: Vec<Alignment>,
    in_table_head: bool,
    cell_index: usize,
}

impl TreeBuilder {
    fn push(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.append_text(text),
            Event::Code(code) => {
                let mut el = Element::new("code");
                el.children.push(Node::Text {
                    value: code.to_string(),
                });
                self.append(Node::Element(el));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.append(Node::Html {
                value: html.to_string(),
            }),
            Event::SoftBreak => self.append(Node::Text {
                value: "\n".to_string(),
            }),
            Event::HardBreak => self.append(Node::Element(Element::new("br"))),
            Event::Rule => self.append(Node::Element(Element::new("hr"))),
            Event::FootnoteReference(label) => {
                let mut link = Element::new("a").attr("href", format!("#{}", label));
                link.children.push(Node::Text {
                    value: label.to_string(),
                });
                let mut sup = Element::new("sup").attr("class", "footnote-reference");
                sup.children.push(Node::Element(link));
                self.append(Node::Element(sup));
            }
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .attr("type", "checkbox")
                    .attr("disabled", "");
                if checked {
                    input = input.attr("checked", "");
                }
                self.append(Node::Element(input));
            }
            other => tracing::trace!("Skipping unsupported markdown event: {:?}", other),
        }
    }

    fn start(&mut self, tag: Tag) {
        let chain: Vec<Element> = match tag {
            Tag::Paragraph => vec![Element::new("p")],
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let rendered = remap_heading_level(level as u8);
                let mut el = Element::new(HEADING_TAGS[usize::from(rendered) - 1]);
                if let Some(id) = id {
                    el = el.attr("id", id.to_string());
                }
                if !classes.is_empty() {
                    let classes: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
                    el = el.attr("class", classes.join(" "));
                }
                for (key, value) in attrs {
                    el = el.attr(&key, value.map(|v| v.to_string()).unwrap_or_default());
                }
                vec![el]
            }
            Tag::BlockQuote(_) => vec![Element::new("blockquote")],
            Tag::CodeBlock(kind) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        code = code.attr("class", format!("language-{}", lang));
                    }
                }
                vec![Element::new("pre"), code]
            }
            Tag::List(Some(1)) => vec![Element::new("ol")],
            Tag::List(Some(start)) => vec![Element::new("ol").attr("start", start.to_string())],
            Tag::List(None) => vec![Element::new("ul")],
            Tag::Item => vec![Element::new("li")],
            Tag::FootnoteDefinition(label) => vec![Element::new("div")
                .attr("class", "footnote-definition")
                .attr("id", label.to_string())],
            Tag::DefinitionList => vec![Element::new("dl")],
            Tag::DefinitionListTitle => vec![Element::new("dt")],
            Tag::DefinitionListDefinition => vec![Element::new("dd")],
            Tag::Table(alignments) => {
                self.alignments = alignments;
                vec![
                    Element::new("div").attr("class", TABLE_WRAPPER_CLASS),
                    Element::new("table"),
                ]
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                vec![Element::new("thead"), Element::new("tr")]
            }
            Tag::TableRow => {
                self.cell_index = 0;
                vec![Element::new("tr")]
            }
            Tag::TableCell => {
                let mut cell = Element::new(if self.in_table_head { "th" } else { "td" });
                let align = match self.alignments.get(self.cell_index) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    cell = cell.attr("style", format!("text-align: {}", align));
                }
                self.cell_index += 1;
                vec![cell]
            }
            Tag::Emphasis => vec![Element::new("em")],
            Tag::Strong => vec![Element::new("strong")],
            Tag::Strikethrough => vec![Element::new("del")],
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut el = Element::new("a").attr("href", dest_url.to_string());
                if !title.is_empty() {
                    el = el.attr("title", title.to_string());
                }
                vec![el]
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // alt is filled in from the image's text children on close
                let mut el = Element::new("img")
                    .attr("src", dest_url.to_string())
                    .attr("alt", "");
                if !title.is_empty() {
                    el = el.attr("title", title.to_string());
                }
                vec![el]
            }
            // HTML blocks and anything else contribute their children directly
            _ => Vec::new(),
        };

        self.spans.push(chain.len());
        self.stack.extend(chain);
    }

    fn end(&mut self, tag: TagEnd) {
        let Some(count) = self.spans.pop() else {
            return;
        };

        let closing_head = matches!(tag, TagEnd::TableHead);
        match tag {
            TagEnd::Image => {
                if let Some(img) = self.stack.last_mut() {
                    let alt = img.text();
                    img.children.clear();
                    img.attrs.insert("alt".to_string(), alt);
                }
            }
            TagEnd::TableHead => self.in_table_head = false,
            _ => {}
        }

        for _ in 0..count {
            self.close_one();
        }

        if closing_head {
            // Body rows belong to the enclosing table's span
            self.stack.push(Element::new("tbody"));
            if let Some(table_span) = self.spans.last_mut() {
                *table_span += 1;
            }
        }
    }

    fn close_one(&mut self) {
        if let Some(el) = self.stack.pop() {
            if el.tag == "tbody" && el.children.is_empty() {
                return;
            }
            self.append(Node::Element(el));
        }
    }

    fn append_text(&mut self, text: CowStr) {
        self.append(Node::Text {
            value: text.to_string(),
        });
    }

    fn append(&mut self, node: Node) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };

        // The parser splits runs of text; keep them as one node
        match (siblings.last_mut(), &node) {
            (Some(Node::Text { value }), Node::Text { value: more })
            | (Some(Node::Html { value }), Node::Html { value: more }) => {
                value.push_str(more);
                return;
            }
            _ => {}
        }
        siblings.push(node);
    }

    fn finish(mut self) -> RenderedContent {
        while !self.stack.is_empty() {
            self.close_one();
        }
        RenderedContent { nodes: self.root }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { value } => out.push_str(value),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Html { .. } => {}
        }
    }
}

fn collect_headings(nodes: &[Node], out: &mut Vec<HeadingEntry>) {
    for node in nodes {
        if let Node::Element(el) = node {
            if let Some(level) = heading_level(el.tag) {
                out.push(HeadingEntry {
                    level,
                    id: el.attrs.get("id").cloned(),
                    text: el.text(),
                });
            } else {
                collect_headings(&el.children, out);
            }
        }
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    HEADING_TAGS
        .iter()
        .position(|t| *t == tag)
        .map(|i| i as u8 + 1)
}

const VOID_TAGS: [&str; 4] = ["br", "hr", "img", "input"];

const BLOCK_TAGS: [&str; 22] = [
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "li", "dl", "dt",
    "dd", "div", "table", "thead", "tbody", "tr", "hr", "br",
];

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text { value } => out.push_str(&html_escape(value)),
        Node::Html { value } => out.push_str(value),
        Node::Element(el) => {
            out.push('<');
            out.push_str(el.tag);
            for (key, value) in &el.attrs {
                out.push_str(&format!(r#" {}="{}""#, key, html_escape(value)));
            }
            out.push('>');

            if !VOID_TAGS.contains(&el.tag) {
                for child in &el.children {
                    write_node(out, child);
                }
                out.push_str(&format!("</{}>", el.tag));
            }

            if BLOCK_TAGS.contains(&el.tag) {
                out.push('\n');
            }
        }
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
