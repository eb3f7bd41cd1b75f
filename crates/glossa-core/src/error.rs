//! Error types for parsing, configuration and translation

use thiserror::Error;

/// Failures that stop the structural parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input contained nothing but whitespace, so there is no root element
    ///
    /// Any other input gets an `html` root from the tree builder.
    #[error("Input is empty")]
    EmptyInput,
}

/// Errors that can occur in the glossa pipeline
#[derive(Error, Debug)]
pub enum GlossaError {
    /// Markup could not be turned into a tree
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The translation collaborator failed
    #[error("Translation provider '{provider}' failed: {message}")]
    TranslationProvider { provider: String, message: String },

    /// Invalid or incomplete settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pre-parsed document is malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document model invariant violated
    #[error("Model error: {0}")]
    Model(#[from] glossa_ast::ModelError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GlossaError {
    /// Build a provider failure
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        GlossaError::TranslationProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, GlossaError::TranslationProvider { .. })
    }
}

/// Result type for glossa operations
pub type Result<T> = std::result::Result<T, GlossaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_provider_errors_retry() {
        assert!(GlossaError::provider("command", "timeout").is_retryable());
        assert!(!GlossaError::Configuration("x".into()).is_retryable());
        assert!(!GlossaError::Parse(ParseError::EmptyInput).is_retryable());
    }

    #[test]
    fn test_provider_message() {
        let err = GlossaError::provider("mapping", "file missing");
        assert_eq!(
            err.to_string(),
            "Translation provider 'mapping' failed: file missing"
        );
    }
}
