//! Style definitions (word/styles.xml and word/numbering.xml)
//!
//! The [`StyleMap`] maps the element roles of the rich document to Word
//! style IDs. The package carries its own definitions for every mapped
//! style, so no external template or stylesheet is needed.
//!
//! # Example
//!
//! ```
//! use glossa_ooxml::styles::{ElementType, StyleMap};
//!
//! let mut map = StyleMap::default();
//! map.set(ElementType::Table, "GrammarTable");
//!
//! assert_eq!(map.get(ElementType::Table), "GrammarTable");
//! assert_eq!(map.heading(2), "Heading2");
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// WordprocessingML main namespace
pub const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Numbering instance for bullet lists
pub const NUM_BULLET: u32 = 1;

/// Numbering instance for numbered lists
pub const NUM_DECIMAL: u32 = 2;

/// Body font used by every style
const BODY_FONT: &str = "Times New Roman";

/// Element roles that map to Word styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Document title
    Title,
    /// Source line under the title
    Source,
    /// Heading level 1-4
    Heading(u8),
    /// Normal paragraph
    Paragraph,
    /// Unordered list item
    ListBullet,
    /// Ordered list item
    ListNumber,
    /// Quotation or note
    Quote,
    /// Table
    Table,
}

/// Maps element roles to Word style IDs
#[derive(Debug, Clone)]
pub struct StyleMap {
    mappings: HashMap<ElementType, String>,
}

impl Default for StyleMap {
    fn default() -> Self {
        let mut mappings = HashMap::new();
        mappings.insert(ElementType::Title, "Title".to_string());
        mappings.insert(ElementType::Source, "Subtitle".to_string());
        for level in 1..=4 {
            mappings.insert(ElementType::Heading(level), format!("Heading{}", level));
        }
        mappings.insert(ElementType::Paragraph, "Normal".to_string());
        mappings.insert(ElementType::ListBullet, "ListBullet".to_string());
        mappings.insert(ElementType::ListNumber, "ListNumber".to_string());
        mappings.insert(ElementType::Quote, "Quote".to_string());
        mappings.insert(ElementType::Table, "LightGridAccent1".to_string());
        Self { mappings }
    }
}

impl StyleMap {
    /// Set a mapping from element role to style ID
    pub fn set(&mut self, element: ElementType, style_id: impl Into<String>) {
        self.mappings.insert(element, style_id.into());
    }

    /// Get the style ID for an element role
    pub fn get(&self, element: ElementType) -> &str {
        self.mappings
            .get(&element)
            .map(|s| s.as_str())
            .unwrap_or_else(|| Self::fallback_style(element))
    }

    /// Style ID for a heading level, clamped to 1-4
    pub fn heading(&self, level: u8) -> &str {
        self.get(ElementType::Heading(level.clamp(1, 4)))
    }

    /// Style ID for list items
    pub fn list(&self, ordered: bool) -> &str {
        if ordered {
            self.get(ElementType::ListNumber)
        } else {
            self.get(ElementType::ListBullet)
        }
    }

    fn fallback_style(element: ElementType) -> &'static str {
        match element {
            ElementType::Table => "TableGrid",
            _ => "Normal",
        }
    }

    /// Render `word/styles.xml` defining every mapped style
    pub fn to_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        write!(xml, r#"<w:styles xmlns:w="{}">"#, WORDML_NS).unwrap();
        xml.push('\n');

        write!(
            xml,
            r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:cs="{f}"/><w:sz w:val="24"/></w:rPr></w:rPrDefault></w:docDefaults>"#,
            f = BODY_FONT
        )
        .unwrap();
        xml.push('\n');

        let normal = self.get(ElementType::Paragraph).to_string();
        push_paragraph_style(&mut xml, &normal, "Normal", None, "", true);

        push_paragraph_style(
            &mut xml,
            self.get(ElementType::Title),
            "Title",
            Some(&normal),
            r#"<w:pPr><w:jc w:val="center"/><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="40"/></w:rPr>"#,
            false,
        );
        push_paragraph_style(
            &mut xml,
            self.get(ElementType::Source),
            "Subtitle",
            Some(&normal),
            r#"<w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:i/></w:rPr>"#,
            false,
        );

        for level in 1..=4u8 {
            // 18pt, 14pt, 13pt, 12pt
            let size = match level {
                1 => 36,
                2 => 28,
                3 => 26,
                _ => 24,
            };
            let props = format!(
                r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="{}"/></w:pPr><w:rPr><w:b/><w:sz w:val="{}"/></w:rPr>"#,
                level - 1,
                size
            );
            push_paragraph_style(
                &mut xml,
                self.heading(level),
                &format!("heading {}", level),
                Some(&normal),
                &props,
                false,
            );
        }

        for (element, name, num_id) in [
            (ElementType::ListBullet, "List Bullet", NUM_BULLET),
            (ElementType::ListNumber, "List Number", NUM_DECIMAL),
        ] {
            let props = format!(
                r#"<w:pPr><w:numPr><w:numId w:val="{}"/></w:numPr><w:ind w:left="720" w:hanging="360"/></w:pPr>"#,
                num_id
            );
            push_paragraph_style(&mut xml, self.get(element), name, Some(&normal), &props, false);
        }

        push_paragraph_style(
            &mut xml,
            self.get(ElementType::Quote),
            "Quote",
            Some(&normal),
            r#"<w:pPr><w:ind w:left="720" w:right="720"/></w:pPr><w:rPr><w:i/></w:rPr>"#,
            false,
        );

        write!(
            xml,
            r#"<w:style w:type="table" w:styleId="{}"><w:name w:val="Light Grid Accent 1"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="8" w:color="4F81BD"/><w:left w:val="single" w:sz="8" w:color="4F81BD"/><w:bottom w:val="single" w:sz="8" w:color="4F81BD"/><w:right w:val="single" w:sz="8" w:color="4F81BD"/><w:insideH w:val="single" w:sz="8" w:color="4F81BD"/><w:insideV w:val="single" w:sz="8" w:color="4F81BD"/></w:tblBorders></w:tblPr></w:style>"#,
            escape_xml(self.get(ElementType::Table))
        )
        .unwrap();
        xml.push('\n');

        xml.push_str("</w:styles>");
        xml
    }
}

fn push_paragraph_style(
    xml: &mut String,
    id: &str,
    name: &str,
    based_on: Option<&str>,
    props: &str,
    default: bool,
) {
    write!(
        xml,
        r#"<w:style w:type="paragraph"{} w:styleId="{}"><w:name w:val="{}"/>"#,
        if default { r#" w:default="1""# } else { "" },
        escape_xml(id),
        escape_xml(name)
    )
    .unwrap();
    if let Some(base) = based_on {
        write!(xml, r#"<w:basedOn w:val="{}"/>"#, escape_xml(base)).unwrap();
    }
    xml.push_str(props);
    xml.push_str("</w:style>\n");
}

/// Render `word/numbering.xml`
///
/// Number 1 is the shared bullet list. Every number from 2 through
/// `last_num_id` is a separate decimal list that restarts at 1.
pub fn numbering_xml(last_num_id: u32) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    write!(xml, r#"<w:numbering xmlns:w="{}">"#, WORDML_NS).unwrap();
    xml.push('\n');

    for (abstract_id, format, text) in [(0, "bullet", "\u{2022}"), (1, "decimal", "%1.")] {
        write!(
            xml,
            r#"<w:abstractNum w:abstractNumId="{}"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="{}"/><w:lvlText w:val="{}"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
            abstract_id, format, text
        )
        .unwrap();
        xml.push('\n');
    }
    write!(
        xml,
        r#"<w:num w:numId="{}"><w:abstractNumId w:val="0"/></w:num>"#,
        NUM_BULLET
    )
    .unwrap();
    xml.push('\n');
    for num_id in NUM_DECIMAL..=last_num_id.max(NUM_DECIMAL) {
        write!(
            xml,
            r#"<w:num w:numId="{}"><w:abstractNumId w:val="1"/><w:lvlOverride w:ilvl="0"><w:startOverride w:val="1"/></w:lvlOverride></w:num>"#,
            num_id
        )
        .unwrap();
        xml.push('\n');
    }

    xml.push_str("</w:numbering>");
    xml
}

/// Type of style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// A style definition read back from `word/styles.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub id: String,
    pub name: String,
    pub style_type: StyleType,
    pub based_on: Option<String>,
    /// Outline level (0 = Heading 1)
    pub outline_level: Option<u8>,
}

/// Styles defined in a package
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, Style>,
    /// Default paragraph style ID
    pub default_paragraph: Option<String>,
}

impl StyleSheet {
    /// Parse styles from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut sheet = StyleSheet::default();
        let mut buf = Vec::new();
        let mut current: Option<(Style, bool)> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    match (e.local_name().as_ref(), current.as_mut()) {
                        (b"style", _) => {
                            let style_type = match get_attr(e, b"w:type").as_deref() {
                                Some("character") => StyleType::Character,
                                Some("table") => StyleType::Table,
                                Some("numbering") => StyleType::Numbering,
                                _ => StyleType::Paragraph,
                            };
                            let id = get_attr(e, b"w:styleId").unwrap_or_default();
                            let is_default = get_attr(e, b"w:default").as_deref() == Some("1");
                            current = Some((
                                Style {
                                    name: id.clone(),
                                    id,
                                    style_type,
                                    based_on: None,
                                    outline_level: None,
                                },
                                is_default,
                            ));
                        }
                        (b"name", Some((style, _))) => {
                            if let Some(val) = get_attr(e, b"w:val") {
                                style.name = val;
                            }
                        }
                        (b"basedOn", Some((style, _))) => {
                            style.based_on = get_attr(e, b"w:val");
                        }
                        (b"outlineLvl", Some((style, _))) => {
                            style.outline_level = get_attr(e, b"w:val").and_then(|v| v.parse().ok());
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.local_name().as_ref() == b"style" {
                        if let Some((style, is_default)) = current.take() {
                            if is_default && style.style_type == StyleType::Paragraph {
                                sheet.default_paragraph = Some(style.id.clone());
                            }
                            if !style.id.is_empty() {
                                sheet.styles.insert(style.id.clone(), style);
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheet)
    }

    /// Get a style by ID
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    /// Check if a style is defined
    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    /// Number of styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if no styles are defined
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Heading level (1-9) for a style, if it's a heading
    pub fn heading_level(&self, style_id: &str) -> Option<u8> {
        self.get(style_id)
            .and_then(|s| s.outline_level)
            .map(|l| l + 1)
    }
}

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}

/// Escape special XML characters
pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mappings() {
        let map = StyleMap::default();
        assert_eq!(map.get(ElementType::Title), "Title");
        assert_eq!(map.heading(1), "Heading1");
        assert_eq!(map.heading(9), "Heading4");
        assert_eq!(map.list(true), "ListNumber");
        assert_eq!(map.list(false), "ListBullet");
        assert_eq!(map.get(ElementType::Table), "LightGridAccent1");
    }

    #[test]
    fn test_styles_xml_defines_every_mapped_style() {
        let map = StyleMap::default();
        let sheet = StyleSheet::parse(map.to_styles_xml().as_bytes()).unwrap();

        for id in [
            "Normal",
            "Title",
            "Subtitle",
            "Heading1",
            "Heading2",
            "Heading3",
            "Heading4",
            "ListBullet",
            "ListNumber",
            "Quote",
            "LightGridAccent1",
        ] {
            assert!(sheet.contains(id), "missing style {}", id);
        }
        assert_eq!(sheet.len(), 11);
        assert_eq!(sheet.default_paragraph.as_deref(), Some("Normal"));
        assert_eq!(sheet.heading_level("Heading3"), Some(3));
        assert_eq!(sheet.get("Heading1").unwrap().name, "heading 1");
        assert_eq!(
            sheet.get("LightGridAccent1").unwrap().style_type,
            StyleType::Table
        );
    }

    #[test]
    fn test_custom_mapping_is_defined() {
        let mut map = StyleMap::default();
        map.set(ElementType::Quote, "Footnote & Note");
        let xml = map.to_styles_xml();
        assert!(xml.contains(r#"w:styleId="Footnote &amp; Note""#));
        assert!(StyleSheet::parse(xml.as_bytes()).is_ok());
    }

    #[test]
    fn test_numbering_xml() {
        let xml = numbering_xml(0);
        assert!(xml.contains(r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#));
        assert!(xml.contains(r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/>"#));
        assert!(!xml.contains(r#"w:numId="3""#));
        assert!(xml.contains(r#"<w:numFmt w:val="decimal"/>"#));
    }

    #[test]
    fn test_numbering_xml_restarts_each_ordered_list() {
        let xml = numbering_xml(4);
        for num_id in 2..=4 {
            assert!(xml.contains(&format!(
                r#"<w:num w:numId="{}"><w:abstractNumId w:val="1"/><w:lvlOverride w:ilvl="0"><w:startOverride w:val="1"/></w:lvlOverride></w:num>"#,
                num_id
            )));
        }
        assert_eq!(xml.matches("<w:startOverride").count(), 3);
    }
}
