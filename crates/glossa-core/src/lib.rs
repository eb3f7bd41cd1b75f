//! glossa-core - Structural round-tripping for translated grammar pages
//!
//! Core library for glossa: parses styled HTML into the shared document
//! tree, extracts the translatable text for an external collaborator,
//! writes the returned text back in place, and regenerates markup.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use glossa_core::{generate_html, HtmlParser, SegmentSet};
//!
//! let html = r#"<html><head><title>Nouns</title></head><body>
//!   <p>The word <span class="foreign">rosa</span></p>
//! </body></html>"#;
//!
//! let mut doc = HtmlParser::new().parse(html, Some("nouns.html")).unwrap();
//! let set = SegmentSet::extract(&mut doc.nodes);
//! assert_eq!(set.len(), 1);
//!
//! let translations = HashMap::from([("seg_0".to_string(), "A palavra".to_string())]);
//! set.reinject(&translations);
//!
//! let output = generate_html(&doc);
//! assert!(output.contains(r#"<p>A palavra <span class="foreign">rosa</span></p>"#));
//! ```

pub mod config;
pub mod css;
pub mod dom;
pub mod error;
pub mod generator;
pub mod glossary;
pub mod input;
pub mod parser;
pub mod segments;
pub mod translate;

// Re-export main types and functions
pub use config::{GeneratorConfig, ParserConfig, Settings, TranslationConfig, SETTINGS_FILE};
pub use error::{GlossaError, ParseError, Result};
pub use generator::{generate_html, generate_html_with_config, HtmlGenerator};
pub use glossary::Glossary;
pub use input::{document_from_json, load_document, InputFormat};
pub use parser::{parse_html, HtmlParser};
pub use segments::{ReinjectReport, RequestUnit, SegmentSet, SegmentSummary, SegmentUnit};
pub use translate::{
    create_provider, list_providers, OutcomeStatus, ProviderInfo, SectionTranslator,
    TranslationOutcome, TranslationProvider, TranslationRequest, TranslationResponse,
    TranslatorStats,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
