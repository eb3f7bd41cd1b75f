//! Structural parser: markup text to [`ParsedDocument`]
//!
//! The parser is tolerant. Markup is first normalized by `html5ever`, then
//! walked once. Elements outside the recognized set are treated as absent
//! rather than reported.
//!
//! # Example
//!
//! ```
//! use glossa_core::HtmlParser;
//! use glossa_ast::TextType;
//!
//! let html = r#"<html><head><title>Nouns</title></head><body>
//!   <p><strong>153.</strong> The word <span class="foreign">rosa</span> means rose.</p>
//! </body></html>"#;
//!
//! let doc = HtmlParser::new().parse(html, Some("nouns.html")).unwrap();
//! assert_eq!(doc.title, "Nouns");
//! assert_eq!(doc.nodes[0].section_number.as_deref(), Some("153"));
//! assert_eq!(doc.stats.latin_segments, 1);
//! assert_eq!(doc.nodes[0].text_segments[2].text_type, TextType::Latin);
//! ```

use std::sync::OnceLock;

use glossa_ast::{
    Attributes, DocumentNode, FormattingStyle, NodeKind, ParsedDocument, TextSegment, TextType,
};
use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;
use tracing::{debug, info};

use crate::config::ParserConfig;
use crate::css::decode_style;
use crate::dom::{
    decode_bytes, element_children, find_nodes, first_descendant, get_child_node_by_name,
    get_node_attr, get_node_attrs, get_node_name, get_text, html_to_dom, text_content,
};
use crate::error::{ParseError, Result};

/// Elements that never contribute content
const SKIPPED_TAGS: &[&str] = &["script", "style", "meta", "link", "head"];

/// Elements flattened into text segments of their parent
const INLINE_TAGS: &[&str] = &["span", "strong", "em", "b", "i", "u", "a", "sup", "sub"];

/// Elements that become child nodes inside mixed content
const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "div", "blockquote", "li", "table", "ol", "ul",
];

/// Wrappers between a table and its rows
const ROW_GROUP_TAGS: &[&str] = &["thead", "tbody", "tfoot"];

/// Table parts that become nodes of their own
const CELL_TAGS: &[&str] = &["tr", "td", "th"];

/// Title used when the document declares none
pub const DEFAULT_TITLE: &str = "Untitled";

/// Encoding recorded when the document declares none
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Markup parser
#[derive(Debug, Clone, Default)]
pub struct HtmlParser {
    config: ParserConfig,
}

impl HtmlParser {
    /// Create a parser with default class rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parser configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse raw bytes, decoding them with the declared charset
    pub fn parse_bytes(&self, data: &[u8], filename: Option<&str>) -> Result<ParsedDocument> {
        let sniffed = decode_bytes(data, None);
        let declared = if sniffed.trim().is_empty() {
            None
        } else {
            get_charset(&html_to_dom(&sniffed)?.document)
        };

        let text = match declared {
            Some(label) if !is_utf8_label(&label) => {
                debug!(charset = %label, "decoding input with declared charset");
                decode_bytes(data, Some(&label))
            }
            _ => sniffed,
        };
        self.parse(&text, filename)
    }

    /// Parse markup text
    pub fn parse(&self, markup: &str, filename: Option<&str>) -> Result<ParsedDocument> {
        if markup.trim().is_empty() {
            return Err(ParseError::EmptyInput.into());
        }

        let dom = html_to_dom(markup)?;
        let html =
            get_child_node_by_name(&dom.document, "html").unwrap_or_else(|| dom.document.clone());

        let title = get_title(&html).unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let encoding = get_charset(&html).unwrap_or_else(|| DEFAULT_ENCODING.to_string());
        let css_file = get_stylesheet(&html);

        let body = get_child_node_by_name(&html, "body").unwrap_or(html);
        let mut nodes = Vec::new();
        self.parse_top_level(&body, &mut nodes);

        let mut doc = ParsedDocument::new(title, nodes);
        doc.encoding = encoding;
        doc.css_file = css_file;
        doc.original_filename = filename.map(str::to_string);

        info!(
            title = %doc.title,
            nodes = doc.stats.total_nodes,
            segments = doc.stats.text_segments,
            sections = doc.sections.len(),
            footnotes = doc.footnotes.len(),
            "parsed document"
        );
        Ok(doc)
    }

    fn parse_top_level(&self, parent: &Handle, nodes: &mut Vec<DocumentNode>) {
        for child in element_children(parent) {
            if self.is_content_root(&child) {
                self.parse_top_level(&child, nodes);
            } else if let Some(node) = self.parse_element(&child) {
                nodes.push(node);
            }
        }
    }

    fn is_content_root(&self, handle: &Handle) -> bool {
        get_node_name(handle) == Some("div")
            && get_node_attr(handle, "id")
                .is_some_and(|id| self.config.content_root_ids.iter().any(|r| *r == id))
    }

    /// Build a node for a recognized element, recursing into its content
    fn parse_element(&self, handle: &Handle) -> Option<DocumentNode> {
        let tag = get_node_name(handle)?;
        if SKIPPED_TAGS.contains(&tag) {
            return None;
        }
        let Some(kind) = NodeKind::from_tag(tag) else {
            debug!(tag, "skipping unrecognized element");
            return None;
        };

        let mut node = node_shell(handle, kind);
        node.section_number = section_label(handle);
        self.mark_footnote(handle, &mut node);

        match kind {
            NodeKind::Table => self.parse_table(handle, &mut node),
            NodeKind::OrderedList | NodeKind::UnorderedList => self.parse_list(handle, &mut node),
            _ => self.parse_content(handle, &mut node),
        }
        Some(node)
    }

    fn parse_table(&self, table: &Handle, node: &mut DocumentNode) {
        for child in element_children(table) {
            match get_node_name(&child) {
                Some("tr") => node.children.push(self.parse_row(&child)),
                Some(group) if ROW_GROUP_TAGS.contains(&group) => {
                    for row in element_children(&child) {
                        if get_node_name(&row) == Some("tr") {
                            node.children.push(self.parse_row(&row));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_row(&self, row: &Handle) -> DocumentNode {
        let mut row_node = node_shell(row, NodeKind::TableRow);
        for cell in element_children(row) {
            let kind = match get_node_name(&cell) {
                Some("td") => NodeKind::TableCell,
                Some("th") => NodeKind::TableHeader,
                _ => continue,
            };
            let mut cell_node = node_shell(&cell, kind);
            self.mark_footnote(&cell, &mut cell_node);
            self.parse_content(&cell, &mut cell_node);
            row_node.children.push(cell_node);
        }
        row_node
    }

    fn parse_list(&self, list: &Handle, node: &mut DocumentNode) {
        for item in element_children(list) {
            if get_node_name(&item) == Some("li") {
                if let Some(item_node) = self.parse_element(&item) {
                    node.children.push(item_node);
                }
            }
        }
    }

    /// Mixed content: text runs and inline elements become segments of
    /// `node`, block elements become children
    fn parse_content(&self, element: &Handle, node: &mut DocumentNode) {
        for child in element.children.borrow().iter() {
            if let Some(text) = get_text(child) {
                let text = text.trim();
                if !text.is_empty() {
                    node.text_segments.push(
                        TextSegment::new(text, TextType::English)
                            .with_formatting(element_formatting(element)),
                    );
                }
                continue;
            }

            let Some(tag) = get_node_name(child) else {
                continue;
            };
            if INLINE_TAGS.contains(&tag) {
                if let Some(segment) = self.parse_inline(child) {
                    node.text_segments.push(segment);
                }
            } else if BLOCK_TAGS.contains(&tag) {
                if let Some(child_node) = self.parse_element(child) {
                    node.children.push(child_node);
                }
            } else if !SKIPPED_TAGS.contains(&tag) {
                debug!(tag, "dropping unrecognized element in mixed content");
            }
        }
    }

    /// Flatten an inline element into one segment
    fn parse_inline(&self, element: &Handle) -> Option<TextSegment> {
        let text = text_content(element);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let class_attr = get_node_attr(element, "class").unwrap_or_default();
        let text_type = self.config.text_type_for(class_attr.split_whitespace());
        let mut segment =
            TextSegment::new(text, text_type).with_formatting(inline_formatting(element));
        if let Some(class) = class_attr.split_whitespace().next() {
            segment = segment.with_class(class);
        }
        Some(segment)
    }

    /// Id of the first footnote anchor in the element's own content
    ///
    /// Anchors inside nested blocks, rows and cells belong to those nodes.
    fn footnote_anchor(&self, handle: &Handle) -> Option<String> {
        element_children(handle).iter().find_map(|child| match get_node_name(child) {
            Some("a") => get_node_attr(child, "id")
                .filter(|id| self.config.is_footnote_id(id))
                .or_else(|| self.footnote_anchor(child)),
            Some(tag) if BLOCK_TAGS.contains(&tag) || CELL_TAGS.contains(&tag) => None,
            _ => self.footnote_anchor(child),
        })
    }

    fn mark_footnote(&self, handle: &Handle, node: &mut DocumentNode) {
        if let Some(id) = self.footnote_anchor(handle) {
            node.is_footnote = true;
            node.footnote_id = Some(id);
        }
    }
}

/// Parse markup with the default configuration
pub fn parse_html(markup: &str, filename: Option<&str>) -> Result<ParsedDocument> {
    HtmlParser::new().parse(markup, filename)
}

/// A node with attributes, id and style lifted from the element
fn node_shell(handle: &Handle, kind: NodeKind) -> DocumentNode {
    let mut attributes = Attributes::new();
    for (name, value) in get_node_attrs(handle) {
        let value = if name == "class" {
            value.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            value
        };
        attributes.insert(name, value);
    }

    let mut node = DocumentNode::new(kind);
    node.node_id = attributes.get("id").cloned();
    node.inline_style = attributes.get("style").cloned();
    node.attributes = attributes;
    node
}

/// Formatting implied by an element's own tag and `style` attribute
fn element_formatting(element: &Handle) -> FormattingStyle {
    let mut formatting = get_node_attr(element, "style")
        .map(|style| decode_style(&style))
        .unwrap_or_default();
    match get_node_name(element) {
        Some("strong" | "b") => formatting.bold = true,
        Some("em" | "i") => formatting.italic = true,
        Some("u") => formatting.underline = true,
        _ => {}
    }
    formatting
}

/// Element formatting plus the emphasis of a sole nested inline element
fn inline_formatting(element: &Handle) -> FormattingStyle {
    let mut formatting = element_formatting(element);
    if let Some(inner) = sole_element_child(element) {
        if get_node_name(&inner).is_some_and(|tag| INLINE_TAGS.contains(&tag)) {
            formatting.merge_emphasis(&inline_formatting(&inner));
        }
    }
    formatting
}

/// The only element child, when every other child is blank text
fn sole_element_child(element: &Handle) -> Option<Handle> {
    let mut found = None;
    for child in element.children.borrow().iter() {
        match &child.data {
            NodeData::Element { .. } => {
                if found.is_some() {
                    return None;
                }
                found = Some(child.clone());
            }
            NodeData::Text { contents } => {
                if !contents.borrow().trim().is_empty() {
                    return None;
                }
            }
            _ => {}
        }
    }
    found
}

/// Section label from the first bold descendant, e.g. "153." gives "153"
pub fn section_label(handle: &Handle) -> Option<String> {
    let strong = first_descendant(handle, &["strong", "b"])?;
    parse_section_label(&text_content(&strong))
}

/// Match a label such as "153", "154a" or "153."
pub fn parse_section_label(text: &str) -> Option<String> {
    static LABEL_RE: OnceLock<Regex> = OnceLock::new();
    let re = LABEL_RE.get_or_init(|| Regex::new(r"^(\d+[a-z]?)\.?$").unwrap());
    re.captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Declared title text
pub fn get_title(html: &Handle) -> Option<String> {
    let title = find_nodes(html, &["title"]).into_iter().next()?;
    let text = text_content(&title).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Declared charset, from `<meta charset>` or an `http-equiv` content type
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta in find_nodes(node, &["meta"]) {
        if let Some(charset) = get_node_attr(&meta, "charset") {
            let charset = charset.trim();
            if !charset.is_empty() {
                return Some(charset.to_string());
            }
        }

        let is_content_type = get_node_attr(&meta, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type");
        if is_content_type {
            if let Some(charset) = get_node_attr(&meta, "content").and_then(|c| charset_param(&c)) {
                return Some(charset);
            }
        }
    }
    None
}

/// Extract the `charset` parameter of a content type value
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// First linked stylesheet
pub fn get_stylesheet(html: &Handle) -> Option<String> {
    find_nodes(html, &["link"]).into_iter().find_map(|link| {
        let rel = get_node_attr(&link, "rel")?;
        rel.split_whitespace()
            .any(|r| r.eq_ignore_ascii_case("stylesheet"))
            .then(|| get_node_attr(&link, "href"))
            .flatten()
    })
}

fn is_utf8_label(label: &str) -> bool {
    let label = label.trim();
    label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}
