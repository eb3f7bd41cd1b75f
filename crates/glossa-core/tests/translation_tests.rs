//! Integration tests for the translation orchestrator
//!
//! A scripted collaborator replays canned replies so retry, partial and
//! failure paths can be exercised without any external program.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glossa_ast::ParsedDocument;
use glossa_core::{
    parse_html, GlossaError, Glossary, OutcomeStatus, Result, SectionTranslator,
    TranslationConfig, TranslationProvider, TranslationRequest, TranslationResponse,
    TranslatorStats,
};

/// Replies in order; records every request it receives
struct ScriptedProvider {
    replies: VecDeque<Result<TranslationResponse>>,
    seen: Rc<RefCell<Vec<TranslationRequest>>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<TranslationResponse>>) -> (Self, Rc<RefCell<Vec<TranslationRequest>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let provider = Self {
            replies: replies.into(),
            seen: Rc::clone(&seen),
        };
        (provider, seen)
    }
}

impl TranslationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn translate_batch(
        &mut self,
        request: &TranslationRequest,
        _glossary: &Glossary,
    ) -> Result<TranslationResponse> {
        self.seen.borrow_mut().push(request.clone());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(GlossaError::provider("scripted", "no reply left")))
    }
}

fn reply(pairs: &[(&str, &str)], tokens: Option<u64>) -> Result<TranslationResponse> {
    Ok(TranslationResponse {
        translations: pairs
            .iter()
            .map(|(id, text)| (id.to_string(), text.to_string()))
            .collect(),
        tokens_used: tokens,
    })
}

fn failure(message: &str) -> Result<TranslationResponse> {
    Err(GlossaError::provider("scripted", message))
}

fn document() -> ParsedDocument {
    parse_html(
        r#"<html><head><title>Verbs</title></head><body>
        <h3>Conjugation</h3>
        <p>The verb <span class="foreign">amo</span> <span class="gloss">I love</span></p>
        </body></html>"#,
        Some("verbs.html"),
    )
    .unwrap()
}

fn texts(doc: &ParsedDocument) -> Vec<String> {
    let mut out = Vec::new();
    doc.walk(|n| out.extend(n.text_segments.iter().map(|s| s.text.clone())));
    out
}

#[test]
fn test_success_applies_translations_and_counts() {
    let (provider, seen) = ScriptedProvider::new(vec![reply(
        &[("seg_0", "Conjugação"), ("seg_1", "O verbo"), ("seg_2", "eu amo")],
        Some(120),
    )]);
    let mut translator = SectionTranslator::new(Box::new(provider));
    let mut doc = document();

    let outcome = translator.translate_document(&mut doc);
    assert_eq!(outcome.status, OutcomeStatus::Translated);
    assert_eq!(outcome.applied, 3);
    assert!(outcome.missing.is_empty());
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.tokens_used, Some(120));
    assert_eq!(outcome.summary.latin, 1);
    assert_eq!(texts(&doc), vec!["Conjugação", "O verbo", "amo", "eu amo"]);

    let requests = seen.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].title, "Verbs");
    assert_eq!(requests[0].filename, "verbs.html");
    let ids: Vec<&str> = requests[0].units.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["seg_0", "seg_1", "seg_2"]);

    let stats = translator.stats();
    assert_eq!(stats.sections_translated, 1);
    assert_eq!(stats.segments_translated, 3);
    assert_eq!(stats.total_tokens, 120);
    assert_eq!(stats.errors, 0);
}

#[test]
fn test_retry_resends_identical_payload() {
    let (provider, seen) = ScriptedProvider::new(vec![
        failure("timeout"),
        failure("rate limited"),
        reply(&[("seg_1", "O verbo")], None),
    ]);
    let mut translator = SectionTranslator::new(Box::new(provider)).with_max_attempts(3);
    let mut doc = document();

    let outcome = translator.translate_document(&mut doc);
    assert!(outcome.is_translated());
    assert_eq!(outcome.attempts, 3);

    let requests = seen.borrow();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(requests[1], requests[2]);
}

#[test]
fn test_all_attempts_failing_leaves_text_unchanged() {
    let (provider, seen) = ScriptedProvider::new(vec![
        failure("first"),
        failure("second"),
        failure("third"),
    ]);
    let mut translator = SectionTranslator::new(Box::new(provider)).with_max_attempts(2);
    let mut doc = document();
    let before = doc.clone();

    let outcome = translator.translate_document(&mut doc);
    match outcome.status {
        OutcomeStatus::Failed { ref message } => assert!(message.contains("second")),
        ref other => panic!("expected failure, got {}", other),
    }
    assert_eq!(outcome.attempts, 2);
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(doc, before);
    assert_eq!(translator.stats().errors, 1);
    assert_eq!(translator.stats().sections_translated, 0);
}

#[test]
fn test_non_retryable_error_stops_immediately() {
    let (provider, seen) = ScriptedProvider::new(vec![
        Err(GlossaError::Configuration("bad key".to_string())),
        reply(&[("seg_0", "never used")], None),
    ]);
    let mut translator = SectionTranslator::new(Box::new(provider));
    let mut doc = document();

    let outcome = translator.translate_document(&mut doc);
    assert!(matches!(outcome.status, OutcomeStatus::Failed { .. }));
    assert_eq!(outcome.attempts, 1);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_partial_reply_reports_missing() {
    let (provider, _) = ScriptedProvider::new(vec![reply(&[("seg_2", "eu amo")], Some(10))]);
    let mut translator = SectionTranslator::new(Box::new(provider));
    let mut doc = document();

    let outcome = translator.translate_document(&mut doc);
    assert!(outcome.is_translated());
    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.missing, vec!["seg_0".to_string(), "seg_1".to_string()]);
    assert_eq!(texts(&doc), vec!["Conjugation", "The verb", "amo", "eu amo"]);
    assert_eq!(translator.stats().segments_translated, 1);
}

#[test]
fn test_nothing_to_translate_skips_call() {
    let (provider, seen) = ScriptedProvider::new(vec![reply(&[("seg_0", "x")], None)]);
    let mut translator = SectionTranslator::new(Box::new(provider));
    let mut doc = parse_html(
        r#"<html><body><p><span class="foreign">arma virumque cano</span></p></body></html>"#,
        None,
    )
    .unwrap();

    let outcome = translator.translate_document(&mut doc);
    assert_eq!(outcome.status, OutcomeStatus::Skipped);
    assert_eq!(outcome.attempts, 0);
    assert!(seen.borrow().is_empty());
    assert_eq!(translator.stats().sections_translated, 0);
}

#[test]
fn test_stats_accumulate_until_reset() {
    let (provider, _) = ScriptedProvider::new(vec![
        reply(&[("seg_0", "a")], Some(5)),
        reply(&[("seg_0", "b")], Some(7)),
    ]);
    let mut translator = SectionTranslator::new(Box::new(provider));

    translator.translate_document(&mut document());
    translator.translate_document(&mut document());
    assert_eq!(translator.stats().sections_translated, 2);
    assert_eq!(translator.stats().total_tokens, 12);

    translator.reset_stats();
    assert_eq!(translator.stats(), TranslatorStats::default());
}

#[test]
fn test_from_config_with_mapping_file() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("verbs.json");
    std::fs::write(&mapping, r#"{"seg_1": "O verbo"}"#).unwrap();
    let glossary = dir.path().join("glossary.toml");
    std::fs::write(&glossary, "Verb = \"Verbo\"\n").unwrap();

    let config = TranslationConfig {
        provider: "mapping".to_string(),
        mapping_file: Some(mapping),
        glossary: Some(glossary),
        ..Default::default()
    };
    let mut translator = SectionTranslator::from_config(&config).unwrap();
    assert_eq!(translator.provider_name(), "mapping");

    let mut doc = document();
    let outcome = translator.translate_document(&mut doc);
    assert_eq!(outcome.applied, 1);
    assert_eq!(texts(&doc)[1], "O verbo");
}

#[test]
fn test_from_config_rejects_zero_attempts() {
    let config = TranslationConfig {
        provider: "mapping".to_string(),
        max_attempts: 0,
        ..Default::default()
    };
    assert!(matches!(
        SectionTranslator::from_config(&config),
        Err(GlossaError::Configuration(_))
    ));
}
