//! Error types for document model construction and validation

use thiserror::Error;

/// Errors raised when a tree violates the document model invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A text segment named a type outside the closed set
    #[error("Unknown text type: {0}")]
    UnknownTextType(String),

    /// A `sections` entry does not resolve to a node with that id
    #[error("Section index entry '{0}' does not point at a matching node")]
    InvalidSectionIndex(String),

    /// A `footnotes` entry does not resolve to a matching footnote node
    #[error("Footnote index entry '{0}' does not point at a matching node")]
    InvalidFootnoteIndex(String),

    /// Stored statistics disagree with a fresh recomputation
    #[error("Stored statistics do not match the tree: {0}")]
    StatsMismatch(String),
}

/// Result type for document model operations
pub type Result<T> = std::result::Result<T, ModelError>;
