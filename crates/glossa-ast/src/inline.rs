//! Leaf text for document content
//!
//! This module defines the text runs that hang off each structural node:
//! the segment itself, its language/role classification and the
//! formatting context it was written in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Characters that suppress the separating space when they open a segment
pub const JOIN_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', ')', ']', '}'];

/// Classification of a text run
///
/// Decided once when the segment is created and never reclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    /// Explanatory prose, translated
    English,
    /// Foreign-language example, preserved verbatim
    Latin,
    /// Rendering of an example, translated
    Gloss,
    /// Bibliographic reference, preserved verbatim
    Reference,
}

impl TextType {
    /// All variants, in declaration order
    pub const ALL: [TextType; 4] = [
        TextType::English,
        TextType::Latin,
        TextType::Gloss,
        TextType::Reference,
    ];

    /// Whether segments of this type are sent for translation
    pub fn is_translatable(self) -> bool {
        matches!(self, TextType::English | TextType::Gloss)
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            TextType::English => "english",
            TextType::Latin => "latin",
            TextType::Gloss => "gloss",
            TextType::Reference => "reference",
        }
    }
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownTextType(s.to_string()))
    }
}

/// Formatting context of a text run
///
/// Bold, italic and underline are flags because the serializers render them
/// as tags or run properties. The remaining fields keep the raw CSS values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingStyle {
    /// Bold weight
    pub bold: bool,
    /// Italic style
    pub italic: bool,
    /// Underline decoration
    pub underline: bool,
    /// Raw `font-size` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    /// Raw `font-family` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Raw `color` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Raw `padding-left` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_left: Option<String>,
    /// Raw `text-align` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

impl FormattingStyle {
    /// Bold-only formatting
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    /// Italic-only formatting
    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Default::default()
        }
    }

    /// CSS declarations that cannot be expressed as formatting tags
    ///
    /// Returned in a fixed order: font-size, font-family, color,
    /// padding-left, text-align.
    pub fn residual_declarations(&self) -> Vec<String> {
        let fields = [
            ("font-size", &self.font_size),
            ("font-family", &self.font_family),
            ("color", &self.color),
            ("padding-left", &self.padding_left),
            ("text-align", &self.text_align),
        ];
        fields
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}: {}", name, v)))
            .collect()
    }

    /// Add the emphasis flags of `other` to this style
    pub fn merge_emphasis(&mut self, other: &FormattingStyle) {
        self.bold |= other.bold;
        self.italic |= other.italic;
        self.underline |= other.underline;
    }

    /// Check if nothing is set
    pub fn is_plain(&self) -> bool {
        *self == FormattingStyle::default()
    }
}

/// One run of leaf text with one formatting context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    /// Text content, trimmed of surrounding source whitespace
    pub text: String,
    /// Classification, fixed at creation
    pub text_type: TextType,
    /// Formatting context
    #[serde(default, skip_serializing_if = "FormattingStyle::is_plain")]
    pub formatting: FormattingStyle,
    /// First CSS class of the source element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
}

impl TextSegment {
    /// Create an unformatted segment
    pub fn new(text: impl Into<String>, text_type: TextType) -> Self {
        Self {
            text: text.into(),
            text_type,
            formatting: FormattingStyle::default(),
            css_class: None,
        }
    }

    /// Create a segment from a type name, rejecting names outside the closed set
    pub fn parse_typed(text: impl Into<String>, text_type: &str) -> crate::Result<Self> {
        Ok(Self::new(text, text_type.parse()?))
    }

    /// Set the formatting context
    pub fn with_formatting(mut self, formatting: FormattingStyle) -> Self {
        self.formatting = formatting;
        self
    }

    /// Set the source CSS class
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    /// Whether this segment is sent for translation
    pub fn is_translatable(&self) -> bool {
        self.text_type.is_translatable()
    }
}

/// Whether a single space belongs between two adjacent runs
///
/// No space is inserted after trailing whitespace, before leading
/// whitespace, or before closing punctuation.
pub fn needs_separator(prev: &str, next: &str) -> bool {
    let prev_ends_blank = prev.chars().next_back().is_some_and(char::is_whitespace);
    let next_opens_tight = next
        .chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || JOIN_PUNCTUATION.contains(&c));
    !prev_ends_blank && !next_opens_tight
}

/// Join runs with the word-join rule
pub fn join_segments<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    let mut prev: Option<&str> = None;
    for part in parts {
        if let Some(p) = prev {
            if needs_separator(p, part) {
                out.push(' ');
            }
        }
        out.push_str(part);
        prev = Some(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_type_translatable() {
        assert!(TextType::English.is_translatable());
        assert!(TextType::Gloss.is_translatable());
        assert!(!TextType::Latin.is_translatable());
        assert!(!TextType::Reference.is_translatable());
    }

    #[test]
    fn test_text_type_from_str() {
        assert_eq!("latin".parse::<TextType>().unwrap(), TextType::Latin);
        assert_eq!("GLOSS".parse::<TextType>().unwrap(), TextType::Gloss);
        assert_eq!(
            "mixed".parse::<TextType>(),
            Err(ModelError::UnknownTextType("mixed".to_string()))
        );
    }

    #[test]
    fn test_segment_rejects_unknown_type() {
        assert!(TextSegment::parse_typed("x", "english").is_ok());
        assert!(TextSegment::parse_typed("x", "klingon").is_err());
    }

    #[test]
    fn test_segment_deserialize_rejects_unknown_type() {
        let json = r#"{"text": "x", "text_type": "mixed"}"#;
        assert!(serde_json::from_str::<TextSegment>(json).is_err());

        let json = r#"{"text": "x", "text_type": "gloss"}"#;
        let seg: TextSegment = serde_json::from_str(json).unwrap();
        assert_eq!(seg.text_type, TextType::Gloss);
        assert!(seg.formatting.is_plain());
    }

    #[test]
    fn test_join_rule() {
        assert_eq!(join_segments(["word", "next"]), "word next");
        assert_eq!(join_segments(["word", ","]), "word,");
        assert_eq!(join_segments(["word ", "next"]), "word next");
        assert_eq!(join_segments(["(see", "§ 153", ")"]), "(see § 153)");
    }

    #[test]
    fn test_needs_separator_edges() {
        assert!(needs_separator("a", "b"));
        assert!(!needs_separator("a\n", "b"));
        assert!(!needs_separator("a", " b"));
        for p in JOIN_PUNCTUATION {
            assert!(!needs_separator("a", &p.to_string()));
        }
        assert!(needs_separator("a", "("));
    }

    #[test]
    fn test_residual_declarations_order() {
        let style = FormattingStyle {
            bold: true,
            text_align: Some("center".to_string()),
            font_size: Some("90%".to_string()),
            ..Default::default()
        };
        assert_eq!(
            style.residual_declarations(),
            vec!["font-size: 90%".to_string(), "text-align: center".to_string()]
        );
    }

    #[test]
    fn test_merge_emphasis() {
        let mut style = FormattingStyle::italic();
        style.merge_emphasis(&FormattingStyle::bold());
        assert!(style.bold && style.italic && !style.underline);
    }
}
