//! glossa-ast - Document tree definitions
//!
//! This crate provides the language-neutral tree that every other glossa
//! crate shares: structural nodes, leaf text segments with their
//! formatting, and the root document aggregate with its lookup indices.
//!
//! # Example
//!
//! ```
//! use glossa_ast::{DocumentNode, NodeKind, ParsedDocument, TextSegment, TextType};
//!
//! let para = DocumentNode::new(NodeKind::Paragraph)
//!     .with_segment(TextSegment::new("The inflection of the Verb.", TextType::English))
//!     .with_segment(TextSegment::new("stella", TextType::Latin).with_class("foreign"));
//!
//! let doc = ParsedDocument::new("Conjugation", vec![para]);
//! assert_eq!(doc.stats.text_segments, 2);
//! assert_eq!(doc.stats.latin_segments, 1);
//! ```

pub mod block;
pub mod document;
pub mod error;
pub mod inline;

pub use block::{Attributes, DocumentNode, NodeKind};
pub use document::{DocumentStats, NodePath, ParsedDocument};
pub use error::{ModelError, Result};
pub use inline::{join_segments, needs_separator, FormattingStyle, TextSegment, TextType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
