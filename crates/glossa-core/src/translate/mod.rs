//! Translation orchestration
//!
//! A [`SectionTranslator`] sends all translatable segments of one document
//! to a [`TranslationProvider`] in a single request, retries failed calls
//! with the identical payload, and writes the returned text back into the
//! tree.

mod prompt;
mod provider;

use std::collections::HashMap;
use std::fmt;

use glossa_ast::ParsedDocument;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use prompt::{build_prompt, parse_response};
pub use provider::{create_provider, list_providers, CommandProvider, MappingProvider, ProviderInfo};

use crate::config::TranslationConfig;
use crate::error::{GlossaError, Result};
use crate::glossary::Glossary;
use crate::segments::{RequestUnit, SegmentSet, SegmentSummary};

/// Target language used when none is configured
pub const DEFAULT_TARGET_LANGUAGE: &str = "Brazilian Portuguese";

/// Filename sent when the document has none
const UNKNOWN_FILENAME: &str = "unknown";

/// Payload for one whole-document call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub title: String,
    pub filename: String,
    pub target_language: String,
    pub units: Vec<RequestUnit>,
}

/// Successful collaborator reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationResponse {
    /// Translated text by unit id; may cover only some units
    pub translations: HashMap<String, String>,
    /// Usage reported by the collaborator
    pub tokens_used: Option<u64>,
}

/// External translation collaborator
pub trait TranslationProvider {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Translate one document's units in a single call
    fn translate_batch(
        &mut self,
        request: &TranslationRequest,
        glossary: &Glossary,
    ) -> Result<TranslationResponse>;
}

/// Running totals across documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranslatorStats {
    pub sections_translated: u64,
    pub segments_translated: u64,
    pub total_tokens: u64,
    pub errors: u64,
}

impl TranslatorStats {
    /// Zero every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How a document left the translator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The collaborator answered and the reply was applied
    Translated,
    /// Nothing to translate; no call was made
    Skipped,
    /// Every attempt failed; the text is unchanged
    Failed { message: String },
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Translated => f.write_str("translated"),
            OutcomeStatus::Skipped => f.write_str("skipped"),
            OutcomeStatus::Failed { message } => write!(f, "failed: {}", message),
        }
    }
}

/// Report for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationOutcome {
    pub status: OutcomeStatus,
    /// Segment counts by type
    pub summary: SegmentSummary,
    /// Units whose text was replaced
    pub applied: usize,
    /// Ids the collaborator did not return
    pub missing: Vec<String>,
    pub tokens_used: Option<u64>,
    /// Calls made to the collaborator
    pub attempts: u32,
}

impl TranslationOutcome {
    fn new(status: OutcomeStatus, summary: SegmentSummary, attempts: u32) -> Self {
        Self {
            status,
            summary,
            applied: 0,
            missing: Vec::new(),
            tokens_used: None,
            attempts,
        }
    }

    /// Whether the collaborator's reply was applied
    pub fn is_translated(&self) -> bool {
        self.status == OutcomeStatus::Translated
    }
}

/// Drives documents through one collaborator
pub struct SectionTranslator {
    provider: Box<dyn TranslationProvider>,
    glossary: Glossary,
    target_language: String,
    max_attempts: u32,
    stats: TranslatorStats,
}

impl SectionTranslator {
    /// Create a translator with three attempts and no glossary
    pub fn new(provider: Box<dyn TranslationProvider>) -> Self {
        Self {
            provider,
            glossary: Glossary::new(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            max_attempts: 3,
            stats: TranslatorStats::default(),
        }
    }

    /// Build the configured provider, glossary and retry limit
    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        if config.max_attempts == 0 {
            return Err(GlossaError::Configuration(
                "`translation.max_attempts` must be at least 1".to_string(),
            ));
        }
        let glossary = match config.glossary {
            Some(ref path) => Glossary::load(path)?,
            None => Glossary::new(),
        };
        Ok(Self::new(create_provider(config)?)
            .with_glossary(glossary)
            .with_target_language(config.target_language.clone())
            .with_max_attempts(config.max_attempts))
    }

    /// Set the glossary passed with every request
    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    /// Set the target language named in requests
    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    /// Set the attempt limit (at least one)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Collaborator name
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Running totals
    pub fn stats(&self) -> TranslatorStats {
        self.stats
    }

    /// Zero the running totals
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Translate one document in place
    ///
    /// Failures never propagate: after the last failed attempt the document
    /// keeps its original text and the outcome carries the last message.
    pub fn translate_document(&mut self, doc: &mut ParsedDocument) -> TranslationOutcome {
        let title = doc.title.clone();
        let filename = doc
            .original_filename
            .clone()
            .unwrap_or_else(|| UNKNOWN_FILENAME.to_string());

        let set = SegmentSet::extract(&mut doc.nodes);
        let summary = set.summary();
        info!(
            title = %title,
            total = summary.total,
            latin = summary.latin,
            english = summary.english,
            gloss = summary.gloss,
            reference = summary.reference,
            to_translate = set.len(),
            provider = self.provider.name(),
            "translating document"
        );

        if set.is_empty() {
            debug!("no translatable segments, skipping provider call");
            return TranslationOutcome::new(OutcomeStatus::Skipped, summary, 0);
        }

        let request = TranslationRequest {
            title,
            filename,
            target_language: self.target_language.clone(),
            units: set.request_units(),
        };

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            debug!(attempt, max = self.max_attempts, "sending translation request");
            match self.provider.translate_batch(&request, &self.glossary) {
                Ok(response) => {
                    let report = set.reinject(&response.translations);
                    self.stats.sections_translated += 1;
                    self.stats.segments_translated += report.applied as u64;
                    self.stats.total_tokens += response.tokens_used.unwrap_or(0);
                    info!(
                        applied = report.applied,
                        missing = report.missing.len(),
                        tokens = response.tokens_used.unwrap_or(0),
                        attempt,
                        "translation applied"
                    );
                    return TranslationOutcome {
                        applied: report.applied,
                        missing: report.missing,
                        tokens_used: response.tokens_used,
                        ..TranslationOutcome::new(OutcomeStatus::Translated, summary, attempt)
                    };
                }
                Err(e) => {
                    warn!(attempt, max = self.max_attempts, error = %e, "translation attempt failed");
                    last_error = e.to_string();
                    if !e.is_retryable() {
                        self.stats.errors += 1;
                        return TranslationOutcome::new(
                            OutcomeStatus::Failed { message: last_error },
                            summary,
                            attempt,
                        );
                    }
                }
            }
        }

        self.stats.errors += 1;
        warn!(attempts = self.max_attempts, "all translation attempts failed, text left unchanged");
        TranslationOutcome::new(
            OutcomeStatus::Failed {
                message: last_error,
            },
            summary,
            self.max_attempts,
        )
    }
}

impl fmt::Debug for SectionTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionTranslator")
            .field("provider", &self.provider.name())
            .field("glossary_terms", &self.glossary.len())
            .field("max_attempts", &self.max_attempts)
            .field("stats", &self.stats)
            .finish()
    }
}
