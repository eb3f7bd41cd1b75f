//! Terminology glossary passed whole to the translation collaborator
//!
//! A glossary file is a flat table of English term to target term, either
//! as TOML (`"Ablative" = "Ablativo"`) or as a JSON object.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GlossaError, Result};

/// English term to target-language term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    terms: BTreeMap<String, String>,
}

impl Glossary {
    /// Create an empty glossary
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a term
    pub fn insert(&mut self, english: impl Into<String>, target: impl Into<String>) {
        self.terms.insert(english.into(), target.into());
    }

    /// Target term for an English term
    pub fn get(&self, english: &str) -> Option<&str> {
        self.terms.get(english).map(|s| s.as_str())
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if the glossary has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a TOML table of terms
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON object of terms
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a glossary file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GlossaError::Configuration(format!("cannot read glossary {}: {}", path.display(), e))
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let glossary = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .map_err(|e| {
            GlossaError::Configuration(format!("invalid glossary {}: {}", path.display(), e))
        })?;
        debug!(terms = glossary.len(), path = %path.display(), "loaded glossary");
        Ok(glossary)
    }

    /// Format as prompt lines, `- English → Target`
    ///
    /// `max_terms` limits the output to the first terms in key order.
    pub fn format_for_prompt(&self, max_terms: Option<usize>) -> String {
        self.iter()
            .take(max_terms.unwrap_or(usize::MAX))
            .map(|(english, target)| format!("- {} → {}", english, target))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            terms: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_prompt() {
        let glossary: Glossary = [("Genitive", "Genitivo"), ("Ablative", "Ablativo")]
            .into_iter()
            .collect();
        assert_eq!(
            glossary.format_for_prompt(None),
            "- Ablative → Ablativo\n- Genitive → Genitivo"
        );
        assert_eq!(glossary.format_for_prompt(Some(1)), "- Ablative → Ablativo");
        assert_eq!(Glossary::new().format_for_prompt(None), "");
    }

    #[test]
    fn test_from_toml_and_json() {
        let toml = Glossary::from_toml_str("Noun = \"Substantivo\"\n\"First Person\" = \"Primeira Pessoa\"\n").unwrap();
        assert_eq!(toml.get("First Person"), Some("Primeira Pessoa"));
        let json = Glossary::from_json_str(r#"{"Noun": "Substantivo"}"#).unwrap();
        assert_eq!(json.get("Noun"), Some("Substantivo"));
        assert!(Glossary::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("terms.json");
        std::fs::write(&json_path, r#"{"Verb": "Verbo"}"#).unwrap();
        assert_eq!(Glossary::load(&json_path).unwrap().len(), 1);

        let toml_path = dir.path().join("terms.toml");
        std::fs::write(&toml_path, "Verb = 3\n").unwrap();
        assert!(matches!(
            Glossary::load(&toml_path),
            Err(GlossaError::Configuration(_))
        ));

        assert!(Glossary::load(&dir.path().join("absent.toml")).is_err());
    }
}
