//! Structural nodes of the document tree
//!
//! Each node owns its direct text runs and its children. There is no
//! sharing between nodes, so the tree is finite and acyclic by construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::inline::{join_segments, TextSegment};

/// Source attributes, ordered by name
pub type Attributes = BTreeMap<String, String>;

/// Node kind, a closed set mirroring the recognized source elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "h1")]
    Heading1,
    #[serde(rename = "h2")]
    Heading2,
    #[serde(rename = "h3")]
    Heading3,
    #[serde(rename = "h4")]
    Heading4,
    #[serde(rename = "p")]
    Paragraph,
    #[serde(rename = "ol")]
    OrderedList,
    #[serde(rename = "ul")]
    UnorderedList,
    #[serde(rename = "li")]
    ListItem,
    #[serde(rename = "table")]
    Table,
    #[serde(rename = "tr")]
    TableRow,
    #[serde(rename = "td")]
    TableCell,
    #[serde(rename = "th")]
    TableHeader,
    #[serde(rename = "blockquote")]
    Blockquote,
    #[serde(rename = "div")]
    Div,
    #[serde(rename = "span")]
    Span,
    #[serde(rename = "a")]
    Link,
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Emphasis,
}

impl NodeKind {
    /// Map a lowercase element name to a kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "h1" => NodeKind::Heading1,
            "h2" => NodeKind::Heading2,
            "h3" => NodeKind::Heading3,
            "h4" => NodeKind::Heading4,
            "p" => NodeKind::Paragraph,
            "ol" => NodeKind::OrderedList,
            "ul" => NodeKind::UnorderedList,
            "li" => NodeKind::ListItem,
            "table" => NodeKind::Table,
            "tr" => NodeKind::TableRow,
            "td" => NodeKind::TableCell,
            "th" => NodeKind::TableHeader,
            "blockquote" => NodeKind::Blockquote,
            "div" => NodeKind::Div,
            "span" => NodeKind::Span,
            "a" => NodeKind::Link,
            "strong" => NodeKind::Strong,
            "em" => NodeKind::Emphasis,
            _ => return None,
        };
        Some(kind)
    }

    /// Element name used when serializing back to markup
    pub fn tag_name(self) -> &'static str {
        match self {
            NodeKind::Heading1 => "h1",
            NodeKind::Heading2 => "h2",
            NodeKind::Heading3 => "h3",
            NodeKind::Heading4 => "h4",
            NodeKind::Paragraph => "p",
            NodeKind::OrderedList => "ol",
            NodeKind::UnorderedList => "ul",
            NodeKind::ListItem => "li",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tr",
            NodeKind::TableCell => "td",
            NodeKind::TableHeader => "th",
            NodeKind::Blockquote => "blockquote",
            NodeKind::Div => "div",
            NodeKind::Span => "span",
            NodeKind::Link => "a",
            NodeKind::Strong => "strong",
            NodeKind::Emphasis => "em",
        }
    }

    /// Heading level (1-4), if this is a heading
    pub fn heading_level(self) -> Option<u8> {
        match self {
            NodeKind::Heading1 => Some(1),
            NodeKind::Heading2 => Some(2),
            NodeKind::Heading3 => Some(3),
            NodeKind::Heading4 => Some(4),
            _ => None,
        }
    }

    /// Ordered or unordered list
    pub fn is_list(self) -> bool {
        matches!(self, NodeKind::OrderedList | NodeKind::UnorderedList)
    }

    /// Data or header cell
    pub fn is_cell(self) -> bool {
        matches!(self, NodeKind::TableCell | NodeKind::TableHeader)
    }
}

/// One structural element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Kind of element
    pub kind: NodeKind,
    /// Stable identifier from the source `id` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Source attributes, verbatim (multi-valued ones space-joined)
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    /// Raw `style` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_style: Option<String>,
    /// Section label such as "153" or "154a"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_number: Option<String>,
    /// Whether the node carries a footnote anchor
    #[serde(default)]
    pub is_footnote: bool,
    /// Identifier of the footnote anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnote_id: Option<String>,
    /// Direct text runs, in document order
    #[serde(default)]
    pub text_segments: Vec<TextSegment>,
    /// Child nodes, in document order
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Create an empty node of the given kind
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            node_id: None,
            attributes: Attributes::new(),
            inline_style: None,
            section_number: None,
            is_footnote: false,
            footnote_id: None,
            text_segments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the node id, mirroring it into the attributes
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.attributes.insert("id".to_string(), id.clone());
        self.node_id = Some(id);
        self
    }

    /// Append a text run
    pub fn with_segment(mut self, segment: TextSegment) -> Self {
        self.text_segments.push(segment);
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Set an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get an attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// Visit this node and its descendants in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a DocumentNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Number of nodes in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(DocumentNode::subtree_len).sum::<usize>()
    }

    /// Flattened plain text of this subtree
    ///
    /// Own runs are joined with the word-join rule, then each non-empty
    /// child's text follows after a single space.
    pub fn plain_text(&self) -> String {
        let own = join_segments(self.text_segments.iter().map(|s| s.text.as_str()));
        let mut parts = Vec::new();
        if !own.is_empty() {
            parts.push(own);
        }
        for child in &self.children {
            let text = child.plain_text();
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::TextType;

    #[test]
    fn test_tag_mapping_roundtrip() {
        for tag in [
            "h1", "h2", "h3", "h4", "p", "ol", "ul", "li", "table", "tr", "td", "th",
            "blockquote", "div", "span", "a", "strong", "em",
        ] {
            let kind = NodeKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag_name(), tag);
        }
        assert_eq!(NodeKind::from_tag("h5"), None);
        assert_eq!(NodeKind::from_tag("script"), None);
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(NodeKind::Heading3.heading_level(), Some(3));
        assert_eq!(NodeKind::Paragraph.heading_level(), None);
    }

    #[test]
    fn test_kind_serializes_as_tag() {
        let json = serde_json::to_string(&NodeKind::Blockquote).unwrap();
        assert_eq!(json, "\"blockquote\"");
        let kind: NodeKind = serde_json::from_str("\"th\"").unwrap();
        assert_eq!(kind, NodeKind::TableHeader);
    }

    #[test]
    fn test_plain_text_flattens_children() {
        let item = DocumentNode::new(NodeKind::ListItem)
            .with_segment(TextSegment::new("amo", TextType::Latin))
            .with_segment(TextSegment::new(",", TextType::English))
            .with_child(
                DocumentNode::new(NodeKind::Paragraph)
                    .with_segment(TextSegment::new("I love", TextType::Gloss)),
            );
        assert_eq!(item.plain_text(), "amo, I love");
    }

    #[test]
    fn test_subtree_len_and_walk() {
        let table = DocumentNode::new(NodeKind::Table).with_child(
            DocumentNode::new(NodeKind::TableRow)
                .with_child(DocumentNode::new(NodeKind::TableHeader))
                .with_child(DocumentNode::new(NodeKind::TableCell)),
        );
        assert_eq!(table.subtree_len(), 4);

        let mut kinds = Vec::new();
        table.walk(&mut |n| kinds.push(n.kind));
        assert_eq!(
            kinds,
            vec![
                NodeKind::Table,
                NodeKind::TableRow,
                NodeKind::TableHeader,
                NodeKind::TableCell
            ]
        );
    }

    #[test]
    fn test_with_id_mirrors_attribute() {
        let node = DocumentNode::new(NodeKind::Div).with_id("sect153");
        assert_eq!(node.node_id.as_deref(), Some("sect153"));
        assert_eq!(node.attribute("id"), Some("sect153"));
    }
}
