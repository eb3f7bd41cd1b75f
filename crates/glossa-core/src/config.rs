//! Configuration settings
//!
//! Settings are read from a `glossa.toml` file. Every table and field is
//! optional; anything left out falls back to the defaults below.
//!
//! ```toml
//! [parser]
//! latin_classes = ["foreign"]
//!
//! [translation]
//! provider = "mapping"
//! mapping_file = "translations.json"
//! ```

use std::path::{Path, PathBuf};

use glossa_ast::TextType;
use serde::{Deserialize, Serialize};

use crate::error::{GlossaError, Result};

/// Name of the settings file looked up by the command line tool
pub const SETTINGS_FILE: &str = "glossa.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Structural parser settings
    pub parser: ParserConfig,
    /// Markup serializer settings
    pub generator: GeneratorConfig,
    /// Translation settings
    pub translation: TranslationConfig,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a file
    ///
    /// A missing file yields the defaults. An unreadable or invalid file is a
    /// configuration error. Relative file paths inside the settings are
    /// resolved against the settings file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            GlossaError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut settings = Self::from_toml_str(&content).map_err(|e| {
            GlossaError::Configuration(format!("invalid settings in {}: {}", path.display(), e))
        })?;
        if let Some(base) = path.parent() {
            settings.translation.resolve_paths(base);
        }
        Ok(settings)
    }

    /// Render the effective settings as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GlossaError::Configuration(format!("cannot render settings: {}", e)))
    }
}

/// Structural parser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Classes marking foreign-language examples
    pub latin_classes: Vec<String>,
    /// Classes marking glosses
    pub gloss_classes: Vec<String>,
    /// Classes marking bibliographic references
    pub reference_classes: Vec<String>,
    /// Anchor id prefixes that mark footnotes
    pub footnote_prefixes: Vec<String>,
    /// Ids of wrapper elements whose children are treated as top-level content
    pub content_root_ids: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            latin_classes: vec!["foreign".to_string()],
            gloss_classes: vec!["gloss".to_string()],
            reference_classes: vec!["bibl".to_string()],
            footnote_prefixes: vec!["fn".to_string(), "rfn".to_string()],
            content_root_ids: vec!["page-wrapper".to_string()],
        }
    }
}

impl ParserConfig {
    /// Class rules in priority order: the first rule with a matching class wins
    pub fn class_rules(&self) -> [(TextType, &[String]); 3] {
        [
            (TextType::Latin, self.latin_classes.as_slice()),
            (TextType::Gloss, self.gloss_classes.as_slice()),
            (TextType::Reference, self.reference_classes.as_slice()),
        ]
    }

    /// Classify an element by its classes
    pub fn text_type_for<'a, I>(&self, classes: I) -> TextType
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        for (text_type, rule) in self.class_rules() {
            if classes.clone().into_iter().any(|c| rule.iter().any(|r| r == c)) {
                return text_type;
            }
        }
        TextType::English
    }

    /// Whether an anchor id marks a footnote
    pub fn is_footnote_id(&self, id: &str) -> bool {
        self.footnote_prefixes.iter().any(|p| id.starts_with(p.as_str()))
    }
}

/// Markup serializer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Stylesheet referenced from the document head
    pub stylesheet: String,
    /// Spaces per indentation level
    pub indent_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            stylesheet: "./site.css".to_string(),
            indent_size: 2,
        }
    }
}

/// Translation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Collaborator name, see [`crate::translate::list_providers`]
    pub provider: String,
    /// Language named in translation requests
    pub target_language: String,
    /// Attempts per document before giving up
    pub max_attempts: u32,
    /// Program and arguments for the `command` provider
    pub command: Vec<String>,
    /// Translation file for the `mapping` provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_file: Option<PathBuf>,
    /// Glossary file (TOML or JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossary: Option<PathBuf>,
}

impl TranslationConfig {
    /// Anchor relative file paths at `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.mapping_file, &mut self.glossary].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: "command".to_string(),
            target_language: crate::translate::DEFAULT_TARGET_LANGUAGE.to_string(),
            max_attempts: 3,
            command: Vec::new(),
            mapping_file: None,
            glossary: None,
        }
    }
}
