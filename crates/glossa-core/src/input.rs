//! Loading documents from markup or pre-parsed JSON

use std::path::Path;

use glossa_ast::ParsedDocument;
use tracing::debug;

use crate::error::{GlossaError, Result};
use crate::parser::HtmlParser;

/// Kind of input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// HTML-family markup
    Markup,
    /// A serialized `ParsedDocument`
    Json,
}

impl InputFormat {
    /// Decide by extension, then by the first non-whitespace byte
    pub fn detect(path: Option<&Path>, data: &[u8]) -> Self {
        if let Some(ext) = path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            if ext.eq_ignore_ascii_case("json") {
                return InputFormat::Json;
            }
            if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") {
                return InputFormat::Markup;
            }
        }
        match data.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => InputFormat::Json,
            _ => InputFormat::Markup,
        }
    }
}

/// Decode and validate a pre-parsed document
///
/// Undecodable JSON and broken index or statistics invariants are both
/// validation errors.
pub fn document_from_json(text: &str) -> Result<ParsedDocument> {
    let doc: ParsedDocument = serde_json::from_str(text)
        .map_err(|e| GlossaError::Validation(format!("malformed document: {}", e)))?;
    doc.validate()
        .map_err(|e| GlossaError::Validation(e.to_string()))?;
    Ok(doc)
}

/// Read a document from disk in either format
pub fn load_document(path: &Path, parser: &HtmlParser) -> Result<ParsedDocument> {
    let data = std::fs::read(path)?;
    let format = InputFormat::detect(Some(path), &data);
    debug!(path = %path.display(), ?format, bytes = data.len(), "loading document");

    match format {
        InputFormat::Json => document_from_json(&String::from_utf8_lossy(&data)),
        InputFormat::Markup => {
            let filename = path.file_name().and_then(|n| n.to_str());
            parser.parse_bytes(&data, filename)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_ast::{DocumentNode, NodeKind, TextSegment, TextType};

    #[test]
    fn test_detect_format() {
        assert_eq!(
            InputFormat::detect(Some(Path::new("a.json")), b"<html>"),
            InputFormat::Json
        );
        assert_eq!(
            InputFormat::detect(Some(Path::new("a.html")), b"{"),
            InputFormat::Markup
        );
        assert_eq!(InputFormat::detect(None, b"  \n{\"title\": 1}"), InputFormat::Json);
        assert_eq!(InputFormat::detect(None, b"<p>x</p>"), InputFormat::Markup);
    }

    #[test]
    fn test_json_document_accepted() {
        let doc = ParsedDocument::new(
            "Nouns",
            vec![DocumentNode::new(NodeKind::Paragraph)
                .with_id("sect1")
                .with_segment(TextSegment::new("Text", TextType::English))],
        );
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(document_from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_json_document_with_stale_stats_rejected() {
        let mut doc = ParsedDocument::new(
            "Nouns",
            vec![DocumentNode::new(NodeKind::Paragraph)
                .with_segment(TextSegment::new("Text", TextType::English))],
        );
        doc.stats.text_segments = 9;
        let json = serde_json::to_string(&doc).unwrap();
        assert!(matches!(
            document_from_json(&json),
            Err(GlossaError::Validation(_))
        ));
        assert!(matches!(
            document_from_json("{\"nodes\": 3}"),
            Err(GlossaError::Validation(_))
        ));
    }

    #[test]
    fn test_load_document_from_markup_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nouns.html");
        std::fs::write(&path, "<html><head><title>Nouns</title></head><body><p>Text</p></body></html>")
            .unwrap();
        let doc = load_document(&path, &HtmlParser::new()).unwrap();
        assert_eq!(doc.title, "Nouns");
        assert_eq!(doc.original_filename.as_deref(), Some("nouns.html"));
        assert_eq!(doc.stats.text_segments, 1);
    }
}
