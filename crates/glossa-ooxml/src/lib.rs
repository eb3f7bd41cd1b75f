//! # glossa-ooxml
//!
//! Rich document output for glossa.
//!
//! This crate provides functionality to:
//! - Convert a parsed document tree into a styled rich document
//! - Package that rich document as a self-contained DOCX file
//! - Read generated packages back for inspection
//!
//! ## Example: Rendering a Document
//!
//! ```
//! use glossa_ast::{DocumentNode, NodeKind, ParsedDocument, TextSegment, TextType};
//! use glossa_ooxml::{render_docx, OoxmlArchive, RichDocument};
//!
//! let para = DocumentNode::new(NodeKind::Paragraph)
//!     .with_segment(TextSegment::new("The word", TextType::English))
//!     .with_segment(TextSegment::new("rosa", TextType::Latin));
//! let doc = ParsedDocument::new("Nouns", vec![para]);
//!
//! let bytes = render_docx(&doc)?;
//! let archive = OoxmlArchive::from_bytes(&bytes)?;
//! let rich = RichDocument::parse(archive.document_xml()?)?;
//!
//! assert!(rich.plain_text().contains("The word rosa"));
//! # Ok::<(), glossa_ooxml::OoxmlError>(())
//! ```

pub mod archive;
pub mod conversion;
pub mod document;
pub mod error;
pub mod relationships;
pub mod styles;
pub mod writer;

pub use archive::OoxmlArchive;
pub use conversion::{convert_document, convert_document_with_styles, ConversionContext, ToRich};
pub use document::{Block, NumberingRef, Paragraph, RichDocument, Run, Table, TableCell, TableRow};
pub use error::{OoxmlError, Result};
pub use relationships::Relationships;
pub use styles::{ElementType, Style, StyleMap, StyleSheet, StyleType};
pub use writer::{render_docx, render_docx_with_styles, write_docx, DocxWriter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
