//! Flat, addressable view of translatable text
//!
//! [`SegmentSet::extract`] walks the tree in pre-order (a node's own segments
//! before its children's) and captures a mutable reference to every ENGLISH
//! and GLOSS segment. Reinjection writes through those references, so
//! positions are never recomputed. The set holds the tree's exclusive
//! borrow until it is consumed, which keeps any other reader off the tree
//! while translated text is being written back.

use std::collections::HashMap;

use glossa_ast::{DocumentNode, TextSegment, TextType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Prefix of generated unit identifiers
pub const SEGMENT_ID_PREFIX: &str = "seg_";

/// One translatable segment, addressable by id
#[derive(Debug)]
pub struct SegmentUnit<'a> {
    id: String,
    text_type: TextType,
    source: String,
    segment: &'a mut TextSegment,
}

impl SegmentUnit<'_> {
    /// Identifier, unique within the extraction
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Text at extraction time
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Segment classification
    pub fn text_type(&self) -> TextType {
        self.text_type
    }

    /// Text currently held by the segment
    pub fn current(&self) -> &str {
        &self.segment.text
    }
}

/// Unit payload sent to a translation collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUnit {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub text_type: TextType,
}

/// Segment counts for the whole document, by type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub total: usize,
    pub english: usize,
    pub latin: usize,
    pub gloss: usize,
    pub reference: usize,
}

impl SegmentSummary {
    fn count(&mut self, text_type: TextType) {
        self.total += 1;
        match text_type {
            TextType::English => self.english += 1,
            TextType::Latin => self.latin += 1,
            TextType::Gloss => self.gloss += 1,
            TextType::Reference => self.reference += 1,
        }
    }

    /// Segments eligible for translation
    pub fn translatable(&self) -> usize {
        self.english + self.gloss
    }
}

/// Result of writing translations back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReinjectReport {
    /// Units whose text was replaced
    pub applied: usize,
    /// Ids with no entry in the mapping, left unchanged
    pub missing: Vec<String>,
}

/// Ordered translatable units of one tree
#[derive(Debug)]
pub struct SegmentSet<'a> {
    units: Vec<SegmentUnit<'a>>,
    summary: SegmentSummary,
}

impl<'a> SegmentSet<'a> {
    /// Capture every translatable segment under `nodes`
    pub fn extract(nodes: &'a mut [DocumentNode]) -> Self {
        let mut set = SegmentSet {
            units: Vec::new(),
            summary: SegmentSummary::default(),
        };
        for node in nodes {
            set.collect(node);
        }
        debug!(
            units = set.units.len(),
            total = set.summary.total,
            "extracted translatable segments"
        );
        set
    }

    fn collect(&mut self, node: &'a mut DocumentNode) {
        let DocumentNode {
            text_segments,
            children,
            ..
        } = node;

        for segment in text_segments {
            self.summary.count(segment.text_type);
            if segment.is_translatable() {
                self.units.push(SegmentUnit {
                    id: format!("{}{}", SEGMENT_ID_PREFIX, self.units.len()),
                    text_type: segment.text_type,
                    source: segment.text.clone(),
                    segment,
                });
            }
        }
        for child in children {
            self.collect(child);
        }
    }

    /// Units in traversal order
    pub fn units(&self) -> &[SegmentUnit<'a>] {
        &self.units
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if nothing is translatable
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Counts over all segments, translatable or not
    pub fn summary(&self) -> SegmentSummary {
        self.summary
    }

    /// Payload for the collaborator, in traversal order
    pub fn request_units(&self) -> Vec<RequestUnit> {
        self.units
            .iter()
            .map(|unit| RequestUnit {
                id: unit.id.clone(),
                text: unit.source.clone(),
                text_type: unit.text_type,
            })
            .collect()
    }

    /// Write translated text through the captured references
    ///
    /// Units whose id is absent from `translations` keep their text and are
    /// listed in the report.
    pub fn reinject(self, translations: &HashMap<String, String>) -> ReinjectReport {
        let mut report = ReinjectReport::default();
        for unit in self.units {
            match translations.get(&unit.id) {
                Some(text) => {
                    unit.segment.text.clone_from(text);
                    report.applied += 1;
                }
                None => report.missing.push(unit.id),
            }
        }
        if !report.missing.is_empty() {
            warn!(
                applied = report.applied,
                missing = report.missing.len(),
                "partial translation, untranslated segments keep their text"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_ast::NodeKind;

    fn tree() -> Vec<DocumentNode> {
        vec![
            DocumentNode::new(NodeKind::Paragraph)
                .with_segment(TextSegment::new("The word", TextType::English))
                .with_segment(TextSegment::new("rosa", TextType::Latin))
                .with_child(
                    DocumentNode::new(NodeKind::Span)
                        .with_segment(TextSegment::new("rose", TextType::Gloss)),
                )
                .with_segment(TextSegment::new("means", TextType::English)),
            DocumentNode::new(NodeKind::Paragraph)
                .with_segment(TextSegment::new("Cic.", TextType::Reference))
                .with_segment(TextSegment::new("end", TextType::English)),
        ]
    }

    #[test]
    fn test_preorder_ids_and_exclusion() {
        let mut nodes = tree();
        let set = SegmentSet::extract(&mut nodes);
        let ids: Vec<&str> = set.units().iter().map(|u| u.id()).collect();
        let texts: Vec<&str> = set.units().iter().map(|u| u.source()).collect();
        assert_eq!(ids, vec!["seg_0", "seg_1", "seg_2", "seg_3"]);
        assert_eq!(texts, vec!["The word", "means", "rose", "end"]);
        assert!(set
            .units()
            .iter()
            .all(|u| u.text_type() == TextType::English || u.text_type() == TextType::Gloss));

        let summary = set.summary();
        assert_eq!(summary.total, 6);
        assert_eq!(summary.latin, 1);
        assert_eq!(summary.reference, 1);
        assert_eq!(summary.translatable(), 4);
    }

    #[test]
    fn test_empty_mapping_changes_nothing() {
        let mut nodes = tree();
        let before = nodes.clone();
        let report = SegmentSet::extract(&mut nodes).reinject(&HashMap::new());
        assert_eq!(report.applied, 0);
        assert_eq!(report.missing.len(), 4);
        assert_eq!(nodes, before);
    }

    #[test]
    fn test_partial_mapping_touches_only_present_ids() {
        let mut nodes = tree();
        let mut mapping = HashMap::new();
        mapping.insert("seg_2".to_string(), "rosa (pt)".to_string());
        mapping.insert("seg_99".to_string(), "ignored".to_string());

        let report = SegmentSet::extract(&mut nodes).reinject(&mapping);
        assert_eq!(report.applied, 1);
        assert_eq!(report.missing, vec!["seg_0", "seg_1", "seg_3"]);

        assert_eq!(nodes[0].children[0].text_segments[0].text, "rosa (pt)");
        assert_eq!(nodes[0].text_segments[0].text, "The word");
        assert_eq!(nodes[0].text_segments[1].text, "rosa");
        assert_eq!(nodes[1].text_segments[1].text, "end");
    }

    #[test]
    fn test_request_units_carry_type() {
        let mut nodes = tree();
        let set = SegmentSet::extract(&mut nodes);
        let units = set.request_units();
        assert_eq!(units[2].text_type, TextType::Gloss);
        let json = serde_json::to_value(&units[2]).unwrap();
        assert_eq!(json["type"], "gloss");
        assert_eq!(json["id"], "seg_2");
    }

    #[test]
    fn test_reinject_writes_through_reference() {
        let mut nodes = tree();
        let mut set = SegmentSet::extract(&mut nodes);
        let mapping: HashMap<String, String> = set
            .request_units()
            .into_iter()
            .map(|u| (u.id, u.text.to_uppercase()))
            .collect();
        assert_eq!(set.units.len(), 4);
        set.units.retain(|u| u.current() != "end");
        set.reinject(&mapping);
        assert_eq!(nodes[0].text_segments[0].text, "THE WORD");
        assert_eq!(nodes[1].text_segments[1].text, "end");
    }
}
