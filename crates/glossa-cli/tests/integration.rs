//! Integration tests for the glossa CLI
//!
//! Commands are driven through the library functions against files in a
//! temporary directory.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use glossa_cli::{parse_command, render_command, translate_command, RenderFormat, TranslateOptions};
use glossa_core::{document_from_json, Settings};
use tempfile::TempDir;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Verbs</title></head>
<body>
  <h3 id="sect180">Conjugation</h3>
  <p id="sect180a"><strong>180.</strong> The verb <span class="foreign">amo</span> <span class="gloss">I love</span></p>
</body>
</html>"#;

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("verbs.html");
    fs::write(&input, PAGE).unwrap();
    (dir, input)
}

fn mapping_options(path: &Path) -> TranslateOptions {
    TranslateOptions {
        provider: Some("mapping".to_string()),
        mapping: Some(path.to_path_buf()),
        ..Default::default()
    }
}

#[test]
fn test_parse_writes_document_tree() {
    let (dir, input) = setup();
    let output = dir.path().join("verbs.json");

    parse_command(&input, Some(&output), true, &Settings::default()).unwrap();

    let doc = document_from_json(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc.title, "Verbs");
    assert_eq!(doc.original_filename.as_deref(), Some("verbs.html"));
    assert_eq!(doc.nodes.len(), 2);
    assert!(doc.section("sect180a").is_some());
}

#[test]
fn test_render_from_json_matches_markup() {
    let (dir, input) = setup();
    let json = dir.path().join("verbs.json");
    let from_markup = dir.path().join("a.html");
    let from_json = dir.path().join("b.html");
    let settings = Settings::default();

    parse_command(&input, Some(&json), false, &settings).unwrap();
    render_command(&input, Some(&from_markup), None, &settings).unwrap();
    render_command(&json, Some(&from_json), None, &settings).unwrap();

    let a = fs::read_to_string(&from_markup).unwrap();
    let b = fs::read_to_string(&from_json).unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("<!DOCTYPE html>"));
    assert!(a.contains(r#"<span class="foreign">amo</span>"#));
}

#[test]
fn test_render_docx_by_extension() {
    let (dir, input) = setup();
    let output = dir.path().join("verbs.docx");

    render_command(&input, Some(&output), None, &Settings::default()).unwrap();

    let file = fs::File::open(&output).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut document = String::new();
    zip.by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut document)
        .unwrap();
    assert!(document.contains("Conjugation"));
    assert!(document.contains("amo"));
    assert!(zip.by_name("word/styles.xml").is_ok());
}

#[test]
fn test_render_docx_needs_output_file() {
    let (_dir, input) = setup();
    let err = render_command(&input, None, Some(RenderFormat::Docx), &Settings::default())
        .unwrap_err();
    assert!(err.to_string().contains("--output"));
}

#[test]
fn test_translate_with_mapping_file() {
    let (dir, input) = setup();
    let mapping = dir.path().join("verbs.translations.json");
    fs::write(
        &mapping,
        r#"{"seg_0": "Conjugação", "seg_2": "O verbo", "seg_3": "eu amo"}"#,
    )
    .unwrap();
    let output = dir.path().join("verbs.pt.html");

    translate_command(
        &input,
        Some(&output),
        None,
        mapping_options(&mapping),
        Settings::default(),
    )
    .unwrap();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("Conjugação"));
    assert!(html.contains("O verbo"));
    assert!(html.contains(r#"<span class="gloss">eu amo</span>"#));
    assert!(html.contains(r#"<span class="foreign">amo</span>"#));
    assert!(!html.contains("I love"));
}

#[test]
fn test_translate_to_json_keeps_structure() {
    let (dir, input) = setup();
    let mapping = dir.path().join("t.json");
    fs::write(&mapping, r#"{"translations": [{"id": "seg_0", "translated": "Conjugação"}]}"#)
        .unwrap();
    let output = dir.path().join("out.json");

    translate_command(
        &input,
        Some(&output),
        None,
        mapping_options(&mapping),
        Settings::default(),
    )
    .unwrap();

    let doc = document_from_json(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc.nodes[0].text_segments[0].text, "Conjugação");
    assert_eq!(doc.nodes[1].section_number.as_deref(), Some("180"));
}

#[test]
fn test_translate_rejects_unknown_provider() {
    let (dir, input) = setup();
    let output = dir.path().join("out.html");
    let options = TranslateOptions {
        provider: Some("telepathy".to_string()),
        ..Default::default()
    };

    let err = translate_command(&input, Some(&output), None, options, Settings::default())
        .unwrap_err();
    assert!(format!("{:#}", err).contains("telepathy"));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.html");
    let err = render_command(&missing, None, None, &Settings::default()).unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}
