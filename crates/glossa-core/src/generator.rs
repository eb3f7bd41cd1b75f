//! Markup Generator
//!
//! This module converts a `glossa_ast::ParsedDocument` back into a complete
//! HTML document that references an external stylesheet.
//!
//! # Example
//!
//! ```
//! use glossa_ast::{DocumentNode, NodeKind, ParsedDocument, TextSegment, TextType};
//! use glossa_core::generate_html;
//!
//! let para = DocumentNode::new(NodeKind::Paragraph)
//!     .with_segment(TextSegment::new("The word", TextType::English))
//!     .with_segment(TextSegment::new("rosa", TextType::Latin))
//!     .with_segment(TextSegment::new(".", TextType::English));
//! let doc = ParsedDocument::new("Nouns", vec![para]);
//!
//! let html = generate_html(&doc);
//! assert!(html.contains(r#"<p>The word <span class="foreign">rosa</span>.</p>"#));
//! ```

use std::fmt::Write;

use glossa_ast::{
    needs_separator, DocumentNode, FormattingStyle, ParsedDocument, TextSegment, TextType,
};

use crate::config::GeneratorConfig;
use crate::css::decode_style;

/// Nesting level of top-level nodes inside the page wrapper
const BODY_LEVEL: usize = 2;

/// Markup generator
pub struct HtmlGenerator {
    config: GeneratorConfig,
    output: String,
}

impl HtmlGenerator {
    /// Create a new generator with default configuration
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    /// Create a generator with custom configuration
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            output: String::new(),
        }
    }

    fn unit(&self) -> String {
        " ".repeat(self.config.indent_size)
    }

    /// Generate a complete document
    pub fn generate(&mut self, doc: &ParsedDocument) -> String {
        self.output.clear();
        let unit = self.unit();

        writeln!(self.output, "<!DOCTYPE html>").unwrap();
        writeln!(self.output, "<html>").unwrap();
        writeln!(self.output).unwrap();
        writeln!(self.output, "<head>").unwrap();
        writeln!(self.output, "{}<title>{}</title>", unit, escape_html(&doc.title)).unwrap();
        writeln!(
            self.output,
            r#"{}<meta http-equiv="Content-Type" content="text/html; charset=utf-8" />"#,
            unit
        )
        .unwrap();
        writeln!(
            self.output,
            r#"{}<link rel="stylesheet" href="{}" />"#,
            unit,
            escape_html(&self.config.stylesheet)
        )
        .unwrap();
        writeln!(self.output, "</head>").unwrap();
        writeln!(self.output).unwrap();
        writeln!(self.output, r#"<body class="simple">"#).unwrap();
        writeln!(self.output, r#"{}<div id="page-wrapper">"#, unit).unwrap();

        for node in &doc.nodes {
            self.generate_node(node, BODY_LEVEL);
            self.output.push('\n');
        }

        writeln!(self.output, "{}</div>", unit).unwrap();
        writeln!(self.output, "</body>").unwrap();
        writeln!(self.output).unwrap();
        write!(self.output, "</html>").unwrap();

        std::mem::take(&mut self.output)
    }

    /// Generate one node and its subtree, without a trailing newline
    pub fn generate_fragment(&mut self, node: &DocumentNode, level: usize) -> String {
        self.output.clear();
        self.generate_node(node, level);
        std::mem::take(&mut self.output)
    }

    fn generate_node(&mut self, node: &DocumentNode, level: usize) {
        let indent = self.unit().repeat(level);
        let tag = node.kind.tag_name();

        write!(self.output, "{}<{}{}>", indent, tag, attribute_string(node)).unwrap();

        if owns_footnote_anchor(node) {
            if let Some(ref id) = node.footnote_id {
                write!(self.output, r#"<a id="{}"></a>"#, escape_html(id)).unwrap();
            }
        }

        let inherited = node
            .inline_style
            .as_deref()
            .map(decode_style)
            .unwrap_or_default();
        self.generate_segments(&node.text_segments, &inherited);

        if node.children.is_empty() {
            write!(self.output, "</{}>", tag).unwrap();
            return;
        }

        for child in &node.children {
            self.output.push('\n');
            self.generate_node(child, level + 1);
        }
        write!(self.output, "\n{}</{}>", indent, tag).unwrap();
    }

    /// Concatenate segments with the word-join rule
    fn generate_segments(&mut self, segments: &[TextSegment], inherited: &FormattingStyle) {
        let mut prev: Option<&TextSegment> = None;
        for segment in segments {
            if let Some(p) = prev {
                if needs_separator(&p.text, &segment.text) {
                    self.output.push(' ');
                }
            }
            self.output.push_str(&segment_html_within(segment, inherited));
            prev = Some(segment);
        }
    }
}

impl Default for HtmlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a document with the default configuration
pub fn generate_html(doc: &ParsedDocument) -> String {
    HtmlGenerator::new().generate(doc)
}

/// Generate a document with custom configuration
pub fn generate_html_with_config(doc: &ParsedDocument, config: GeneratorConfig) -> String {
    HtmlGenerator::with_config(config).generate(doc)
}

/// Attributes in `id`, preserved, `style` order, each with a leading space
fn attribute_string(node: &DocumentNode) -> String {
    let mut out = String::new();
    if let Some(ref id) = node.node_id {
        write!(out, r#" id="{}""#, escape_html(id)).unwrap();
    }
    for (name, value) in &node.attributes {
        if name == "id" || name == "style" {
            continue;
        }
        write!(out, r#" {}="{}""#, name, escape_html(value)).unwrap();
    }
    if let Some(ref style) = node.inline_style {
        write!(out, r#" style="{}""#, escape_html(style)).unwrap();
    }
    out
}

/// Whether this node, rather than a descendant, carries its footnote anchor
fn owns_footnote_anchor(node: &DocumentNode) -> bool {
    if !node.is_footnote || node.footnote_id.is_none() {
        return false;
    }
    let mut in_descendant = false;
    for child in &node.children {
        child.walk(&mut |n| {
            if n.is_footnote && n.footnote_id == node.footnote_id {
                in_descendant = true;
            }
        });
    }
    !in_descendant
}

/// Wrapper class: explicit class, else one implied by the text type
fn wrapper_class(segment: &TextSegment) -> Option<&str> {
    match (&segment.css_class, segment.text_type) {
        (Some(class), _) => Some(class.as_str()),
        (None, TextType::Latin) => Some("foreign"),
        (None, TextType::Gloss) => Some("gloss"),
        _ => None,
    }
}

/// Render one segment
///
/// Emphasis is always expressed as nested `strong`, `em`, `u` tags. A `span`
/// wrapper is added when the segment needs a class or has residual style.
pub fn segment_html(segment: &TextSegment) -> String {
    segment_html_within(segment, &FormattingStyle::default())
}

/// Render one segment inside an element whose own style is `inherited`
///
/// Residual declarations the element already carries are not repeated.
fn segment_html_within(segment: &TextSegment, inherited: &FormattingStyle) -> String {
    let mut text = escape_html(&segment.text);
    let formatting = &segment.formatting;
    if formatting.bold {
        text = format!("<strong>{}</strong>", text);
    }
    if formatting.italic {
        text = format!("<em>{}</em>", text);
    }
    if formatting.underline {
        text = format!("<u>{}</u>", text);
    }

    let class = wrapper_class(segment);
    let style = own_declarations(formatting, inherited);
    if class.is_none() && style.is_empty() {
        return text;
    }

    let mut attrs = String::new();
    if let Some(class) = class {
        write!(attrs, r#" class="{}""#, escape_html(class)).unwrap();
    }
    if !style.is_empty() {
        write!(attrs, r#" style="{}""#, escape_html(&style.join("; "))).unwrap();
    }
    format!("<span{}>{}</span>", attrs, text)
}

/// Residual declarations that differ from the enclosing element's
fn own_declarations(formatting: &FormattingStyle, inherited: &FormattingStyle) -> Vec<String> {
    let mut own = formatting.clone();
    for (field, outer) in [
        (&mut own.font_size, &inherited.font_size),
        (&mut own.font_family, &inherited.font_family),
        (&mut own.color, &inherited.color),
        (&mut own.padding_left, &inherited.padding_left),
        (&mut own.text_align, &inherited.text_align),
    ] {
        if field == outer {
            *field = None;
        }
    }
    own.residual_declarations()
}

/// Escape text for element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
