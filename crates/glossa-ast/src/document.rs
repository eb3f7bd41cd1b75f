//! Document root, lookup indices and statistics
//!
//! The root aggregate exclusively owns the tree. The `sections` and
//! `footnotes` indices are non-owning: they store the path from the root to
//! the indexed node and are rebuilt from the tree in a single pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::{DocumentNode, NodeKind};
use crate::error::{ModelError, Result};
use crate::inline::TextType;

/// Child-index path from the top-level node sequence to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path to a top-level node
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path to the `index`-th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Raw indices
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting depth (1 for top-level nodes)
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Counters derived from the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStats {
    /// Every node in the tree
    pub total_nodes: usize,
    /// Every text segment
    pub text_segments: usize,
    pub english_segments: usize,
    pub latin_segments: usize,
    pub gloss_segments: usize,
    pub reference_segments: usize,
    /// Table nodes
    pub tables: usize,
    /// Ordered and unordered list nodes
    pub lists: usize,
}

impl DocumentStats {
    /// Walk the tree once and count
    pub fn compute(nodes: &[DocumentNode]) -> Self {
        let mut stats = DocumentStats::default();
        for node in nodes {
            node.walk(&mut |n| {
                stats.total_nodes += 1;
                if n.kind == NodeKind::Table {
                    stats.tables += 1;
                }
                if n.kind.is_list() {
                    stats.lists += 1;
                }
                for segment in &n.text_segments {
                    stats.text_segments += 1;
                    match segment.text_type {
                        TextType::English => stats.english_segments += 1,
                        TextType::Latin => stats.latin_segments += 1,
                        TextType::Gloss => stats.gloss_segments += 1,
                        TextType::Reference => stats.reference_segments += 1,
                    }
                }
            });
        }
        stats
    }

    /// Segments eligible for translation
    pub fn translatable_segments(&self) -> usize {
        self.english_segments + self.gloss_segments
    }
}

fn default_title() -> String {
    "Untitled".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// A completely parsed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Declared title, or "Untitled"
    #[serde(default = "default_title")]
    pub title: String,
    /// Declared character set, or "utf-8"
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// First linked stylesheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_file: Option<String>,
    /// Name of the source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    /// Top-level nodes
    #[serde(default)]
    pub nodes: Vec<DocumentNode>,
    /// Node id to node
    #[serde(default)]
    pub sections: BTreeMap<String, NodePath>,
    /// Footnote id to node
    #[serde(default)]
    pub footnotes: BTreeMap<String, NodePath>,
    /// Derived counters
    #[serde(default)]
    pub stats: DocumentStats,
}

impl ParsedDocument {
    /// Create a document, building indices and statistics from the tree
    pub fn new(title: impl Into<String>, nodes: Vec<DocumentNode>) -> Self {
        let mut doc = Self {
            title: title.into(),
            encoding: default_encoding(),
            css_file: None,
            original_filename: None,
            nodes,
            sections: BTreeMap::new(),
            footnotes: BTreeMap::new(),
            stats: DocumentStats::default(),
        };
        doc.rebuild_indices();
        doc.refresh_stats();
        doc
    }

    /// Rebuild `sections` and `footnotes` in one post-order pass
    ///
    /// When an id occurs more than once the first node reached in
    /// post-order keeps the entry.
    pub fn rebuild_indices(&mut self) {
        let mut sections = BTreeMap::new();
        let mut footnotes = BTreeMap::new();

        fn visit(
            node: &DocumentNode,
            path: NodePath,
            sections: &mut BTreeMap<String, NodePath>,
            footnotes: &mut BTreeMap<String, NodePath>,
        ) {
            for (i, child) in node.children.iter().enumerate() {
                visit(child, path.child(i), sections, footnotes);
            }
            if let Some(ref id) = node.node_id {
                sections.entry(id.clone()).or_insert_with(|| path.clone());
            }
            if node.is_footnote {
                if let Some(ref id) = node.footnote_id {
                    footnotes.entry(id.clone()).or_insert(path);
                }
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            visit(node, NodePath::root(i), &mut sections, &mut footnotes);
        }

        self.sections = sections;
        self.footnotes = footnotes;
    }

    /// Recompute statistics from the tree without storing them
    pub fn recompute_stats(&self) -> DocumentStats {
        DocumentStats::compute(&self.nodes)
    }

    /// Replace stored statistics with a fresh recomputation
    pub fn refresh_stats(&mut self) {
        self.stats = self.recompute_stats();
    }

    /// Resolve a path to a node
    pub fn node_at(&self, path: &NodePath) -> Option<&DocumentNode> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.nodes.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Look up a node by id
    pub fn section(&self, id: &str) -> Option<&DocumentNode> {
        self.sections.get(id).and_then(|p| self.node_at(p))
    }

    /// Look up a footnote node by footnote id
    pub fn footnote(&self, id: &str) -> Option<&DocumentNode> {
        self.footnotes.get(id).and_then(|p| self.node_at(p))
    }

    /// Visit every node in pre-order
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a DocumentNode)) {
        for node in &self.nodes {
            node.walk(&mut visit);
        }
    }

    /// Check the index and statistics invariants
    ///
    /// Used for documents that arrive already parsed (e.g. as JSON) rather
    /// than through the parser.
    pub fn validate(&self) -> Result<()> {
        for (id, path) in &self.sections {
            match self.node_at(path) {
                Some(node) if node.node_id.as_deref() == Some(id.as_str()) => {}
                _ => return Err(ModelError::InvalidSectionIndex(id.clone())),
            }
        }
        for (id, path) in &self.footnotes {
            match self.node_at(path) {
                Some(node)
                    if node.is_footnote && node.footnote_id.as_deref() == Some(id.as_str()) => {}
                _ => return Err(ModelError::InvalidFootnoteIndex(id.clone())),
            }
        }
        let fresh = self.recompute_stats();
        if fresh != self.stats {
            return Err(ModelError::StatsMismatch(format!(
                "stored {:?}, computed {:?}",
                self.stats, fresh
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::TextSegment;

    fn sample() -> ParsedDocument {
        let footnote = DocumentNode {
            is_footnote: true,
            footnote_id: Some("fn1".to_string()),
            ..DocumentNode::new(NodeKind::Paragraph)
        }
        .with_segment(TextSegment::new("A note.", TextType::English));

        let list = DocumentNode::new(NodeKind::UnorderedList).with_child(
            DocumentNode::new(NodeKind::ListItem)
                .with_segment(TextSegment::new("rosa", TextType::Latin))
                .with_segment(TextSegment::new("rose", TextType::Gloss)),
        );

        let section = DocumentNode::new(NodeKind::Div)
            .with_id("sect153")
            .with_child(
                DocumentNode::new(NodeKind::Paragraph)
                    .with_segment(TextSegment::new("Cf.", TextType::Reference)),
            )
            .with_child(list)
            .with_child(footnote);

        ParsedDocument::new("Nouns", vec![section, DocumentNode::new(NodeKind::Table)])
    }

    #[test]
    fn test_stats_compute() {
        let doc = sample();
        let stats = doc.stats;
        assert_eq!(stats.total_nodes, 6);
        assert_eq!(stats.text_segments, 4);
        assert_eq!(stats.english_segments, 1);
        assert_eq!(stats.latin_segments, 1);
        assert_eq!(stats.gloss_segments, 1);
        assert_eq!(stats.reference_segments, 1);
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.lists, 1);
        assert_eq!(stats.translatable_segments(), 2);
        assert_eq!(doc.recompute_stats(), doc.stats);
    }

    #[test]
    fn test_indices_resolve() {
        let doc = sample();
        let section = doc.section("sect153").unwrap();
        assert_eq!(section.kind, NodeKind::Div);
        let note = doc.footnote("fn1").unwrap();
        assert_eq!(note.text_segments[0].text, "A note.");
        assert_eq!(doc.footnotes["fn1"].indices(), &[0, 2]);
        assert!(doc.section("missing").is_none());
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dangling_index() {
        let mut doc = sample();
        doc.sections.insert("ghost".to_string(), NodePath::root(9));
        assert_eq!(
            doc.validate(),
            Err(ModelError::InvalidSectionIndex("ghost".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_stale_stats() {
        let mut doc = sample();
        doc.stats.tables = 0;
        assert!(matches!(doc.validate(), Err(ModelError::StatsMismatch(_))));
    }

    #[test]
    fn test_clone_is_deep() {
        let doc = sample();
        let mut copy = doc.clone();
        copy.nodes[0].children[0].text_segments[0].text = "changed".to_string();
        assert_eq!(doc.nodes[0].children[0].text_segments[0].text, "Cf.");
    }

    #[test]
    fn test_json_roundtrip_keeps_indices() {
        let doc = sample();
        let json = serde_json::to_string(&doc).unwrap();
        let back: ParsedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_sparse_json() {
        let doc: ParsedDocument = serde_json::from_str(r#"{"nodes": []}"#).unwrap();
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.encoding, "utf-8");
    }
}
