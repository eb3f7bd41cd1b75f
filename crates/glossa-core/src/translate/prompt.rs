//! Prompt construction and response decoding shared by text-in/text-out
//! collaborators

use std::collections::HashMap;

use serde::Deserialize;

use super::TranslationRequest;
use crate::error::{GlossaError, Result};
use crate::glossary::Glossary;

#[derive(Debug, Deserialize)]
struct ResponseBody {
    translations: Vec<ResponseItem>,
}

#[derive(Debug, Deserialize)]
struct ResponseItem {
    id: String,
    translated: String,
}

/// Build the instruction text for one whole-document request
pub fn build_prompt(request: &TranslationRequest, glossary: &Glossary) -> Result<String> {
    let segments = serde_json::to_string_pretty(&request.units)?;
    let glossary_text = if glossary.is_empty() {
        "(no glossary terms)".to_string()
    } else {
        glossary.format_for_prompt(None)
    };

    Ok(format!(
        r#"You are translating one complete section of a Latin reference grammar from English into {language}.
Keep the academic register and use consistent terminology across the whole section.

SECTION
Title: {title}
File: {filename}
Segments to translate: {count}

GLOSSARY (always use these terms where they apply)
{glossary}

RULES
1. Use the glossary terms for grammatical concepts.
2. Keep terminology consistent across all segments.
3. Preserve numbers, references such as "§ 153", and punctuation.
4. Segments of type "gloss" render a Latin example: translate them naturally.
5. Segments of type "english" are explanatory prose: keep the explanatory tone.
6. Return every segment id exactly once.

SEGMENTS
{segments}

RESPONSE FORMAT
Return only a JSON object of this shape, with no text before or after it:
{{
  "translations": [
    {{ "id": "seg_0", "translated": "translated text" }}
  ]
}}
"#,
        language = request.target_language,
        title = request.title,
        filename = request.filename,
        count = request.units.len(),
        glossary = glossary_text,
        segments = segments,
    ))
}

/// Decode a collaborator reply into an id to text mapping
///
/// Markdown code fences around the JSON object are stripped. A reply that
/// does not decode, or decodes to no translations, is a provider failure.
pub fn parse_response(provider: &str, text: &str) -> Result<HashMap<String, String>> {
    let cleaned = strip_fences(text);
    let body: ResponseBody = serde_json::from_str(cleaned)
        .map_err(|e| GlossaError::provider(provider, format!("undecodable response: {}", e)))?;
    if body.translations.is_empty() {
        return Err(GlossaError::provider(provider, "response contains no translations"));
    }
    Ok(body
        .translations
        .into_iter()
        .map(|item| (item.id, item.translated))
        .collect())
}

/// Slice from the first `{` to the last `}` when the reply is fenced
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::RequestUnit;
    use glossa_ast::TextType;

    fn request() -> TranslationRequest {
        TranslationRequest {
            title: "Nouns".to_string(),
            filename: "nouns.html".to_string(),
            target_language: "Brazilian Portuguese".to_string(),
            units: vec![RequestUnit {
                id: "seg_0".to_string(),
                text: "The Ablative".to_string(),
                text_type: TextType::English,
            }],
        }
    }

    #[test]
    fn test_prompt_contents() {
        let glossary: Glossary = [("Ablative", "Ablativo")].into_iter().collect();
        let prompt = build_prompt(&request(), &glossary).unwrap();
        assert!(prompt.contains("into Brazilian Portuguese"));
        assert!(prompt.contains("Title: Nouns"));
        assert!(prompt.contains("File: nouns.html"));
        assert!(prompt.contains("Segments to translate: 1"));
        assert!(prompt.contains("- Ablative → Ablativo"));
        assert!(prompt.contains("\"id\": \"seg_0\""));
        assert!(prompt.contains("\"type\": \"english\""));
        assert!(prompt.contains("\"translations\": ["));
    }

    #[test]
    fn test_parse_plain_response() {
        let map = parse_response(
            "test",
            r#"{"translations": [{"id": "seg_0", "translated": "O Ablativo"}]}"#,
        )
        .unwrap();
        assert_eq!(map["seg_0"], "O Ablativo");
    }

    #[test]
    fn test_parse_fenced_response() {
        let reply = "```json\n{\"translations\": [{\"id\": \"seg_1\", \"translated\": \"x\"}]}\n```";
        let map = parse_response("test", reply).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["seg_1"], "x");
    }

    #[test]
    fn test_parse_failures_are_provider_errors() {
        let err = parse_response("test", "Sorry, I cannot help.").unwrap_err();
        assert!(err.is_retryable());
        let err = parse_response("test", r#"{"translations": []}"#).unwrap_err();
        assert!(matches!(err, GlossaError::TranslationProvider { .. }));
    }
}
