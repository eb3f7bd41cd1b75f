//! glossa CLI - Command-line interface library
//!
//! This library provides the CLI functionality for glossa, including:
//! - Parse: Convert a grammar page to its JSON document tree
//! - Render: Regenerate HTML or produce a DOCX from markup or JSON
//! - Translate: Send the translatable text to a collaborator and write the result
//! - Info: Report version, collaborators and effective settings
//!
//! # Binary Usage
//!
//! ```bash
//! # Inspect the document tree
//! glossa parse sect419.html --pretty
//!
//! # Produce a Word document
//! glossa render sect419.html --output sect419.docx
//!
//! # Reinject a ready-made translation file
//! glossa translate sect419.html --provider mapping --mapping sect419.json -o out.html
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{info_command, parse_command, render_command, translate_command};
pub use app::{run_cli, InfoFormat, RenderFormat, TranslateOptions};
