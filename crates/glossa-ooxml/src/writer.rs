//! DOCX Writer
//!
//! Packages a [`RichDocument`] as a self-contained WordprocessingML file:
//! the document body, style and numbering definitions, core properties,
//! relationships and content types. No template is needed.
//!
//! # Example
//!
//! ```
//! use glossa_ooxml::{DocxWriter, OoxmlArchive, Paragraph, RichDocument, Run};
//! use glossa_ooxml::document::Block;
//!
//! let mut doc = RichDocument::new();
//! doc.blocks.push(Block::Paragraph(
//!     Paragraph::styled("Normal").with_run(Run::italic("rosa")),
//! ));
//!
//! let bytes = DocxWriter::generate(&doc).unwrap();
//! let archive = OoxmlArchive::from_bytes(&bytes).unwrap();
//! assert!(archive.contains("word/document.xml"));
//! ```

use std::path::Path;

use glossa_ast::ParsedDocument;
use tracing::{debug, info};

use crate::archive::{OoxmlArchive, DOCUMENT_PART, NUMBERING_PART, STYLES_PART};
use crate::conversion::convert_document_with_styles;
use crate::document::{Block, Paragraph, RichDocument, Run, Table};
use crate::error::Result;
use crate::relationships::Relationships;
use crate::styles::{escape_xml, numbering_xml, StyleMap, NUM_DECIMAL, WORDML_NS};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CORE_PART: &str = "docProps/core.xml";

/// Usable page width in twips, shared evenly between table columns
const TABLE_WIDTH: usize = 9000;

/// DOCX Writer for generating DOCX files from a rich document
pub struct DocxWriter {
    /// XML output buffer
    output: String,
    /// Style mapping, also used for the generated styles part
    style_map: StyleMap,
    /// Title for the core properties
    title: Option<String>,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxWriter {
    /// Create a writer with the default style mapping
    pub fn new() -> Self {
        Self::with_style_map(StyleMap::default())
    }

    /// Create a writer with a custom style mapping
    pub fn with_style_map(style_map: StyleMap) -> Self {
        Self {
            output: String::new(),
            style_map,
            title: None,
        }
    }

    /// Title recorded in the core properties
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// The style mapping in use
    pub fn style_map(&self) -> &StyleMap {
        &self.style_map
    }

    /// Generate a DOCX with default settings
    pub fn generate(doc: &RichDocument) -> Result<Vec<u8>> {
        Self::new().write(doc)
    }

    /// Package a rich document and return the DOCX bytes
    pub fn write(&mut self, doc: &RichDocument) -> Result<Vec<u8>> {
        let archive = self.package(doc);
        let bytes = archive.to_bytes()?;
        info!(
            blocks = doc.blocks.len(),
            bytes = bytes.len(),
            "Generated DOCX package"
        );
        Ok(bytes)
    }

    /// Assemble every package part in memory
    pub fn package(&mut self, doc: &RichDocument) -> OoxmlArchive {
        let mut archive = OoxmlArchive::new();
        archive.set_string(CONTENT_TYPES_PART, content_types_xml());
        archive.set_string(PACKAGE_RELS_PART, Relationships::package().to_xml());
        archive.set_string(DOCUMENT_RELS_PART, Relationships::document().to_xml());
        archive.set_string(CORE_PART, core_properties_xml(self.title.as_deref()));
        archive.set_string(STYLES_PART, self.style_map.to_styles_xml());
        let last_num_id = doc
            .paragraphs()
            .filter_map(|p| p.numbering)
            .map(|n| n.num_id)
            .max()
            .unwrap_or(NUM_DECIMAL);
        archive.set_string(NUMBERING_PART, numbering_xml(last_num_id));
        archive.set_string(DOCUMENT_PART, self.generate_document_xml(doc));
        debug!(parts = archive.file_list().len(), "Assembled DOCX parts");
        archive
    }

    /// Generate the complete document.xml content
    fn generate_document_xml(&mut self, doc: &RichDocument) -> String {
        self.output.clear();

        self.output
            .push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        self.output.push('\n');
        self.output.push_str(&format!(
            r#"<w:document xmlns:w="{}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            WORDML_NS
        ));
        self.output.push('\n');
        self.output.push_str("<w:body>\n");

        for block in &doc.blocks {
            match block {
                Block::Paragraph(para) => self.generate_paragraph(para),
                Block::Table(table) => self.generate_table(table),
            }
        }

        // Letter-size page, one inch margins
        self.output.push_str(
            "<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/><w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>\n",
        );
        self.output.push_str("</w:body>\n");
        self.output.push_str("</w:document>");

        std::mem::take(&mut self.output)
    }

    /// Generate XML for a paragraph
    fn generate_paragraph(&mut self, para: &Paragraph) {
        let has_props = para.style_id.is_some()
            || para.numbering.is_some()
            || para.indent.is_some()
            || para.centered;

        if !has_props && para.runs.is_empty() {
            self.output.push_str("<w:p/>\n");
            return;
        }

        self.output.push_str("<w:p>\n");

        if has_props {
            self.output.push_str("<w:pPr>\n");
            if let Some(style) = &para.style_id {
                self.output
                    .push_str(&format!("<w:pStyle w:val=\"{}\"/>\n", escape_xml(style)));
            }
            if let Some(numbering) = para.numbering {
                self.output.push_str("<w:numPr>\n");
                self.output
                    .push_str(&format!("<w:ilvl w:val=\"{}\"/>\n", numbering.ilvl));
                self.output
                    .push_str(&format!("<w:numId w:val=\"{}\"/>\n", numbering.num_id));
                self.output.push_str("</w:numPr>\n");
            }
            if let Some(indent) = para.indent {
                self.output.push_str(&format!(
                    "<w:ind w:left=\"{0}\" w:right=\"{0}\"/>\n",
                    indent
                ));
            }
            if para.centered {
                self.output.push_str("<w:jc w:val=\"center\"/>\n");
            }
            self.output.push_str("</w:pPr>\n");
        }

        for run in &para.runs {
            self.generate_run(run);
        }

        self.output.push_str("</w:p>\n");
    }

    /// Generate XML for a run
    fn generate_run(&mut self, run: &Run) {
        self.output.push_str("<w:r>\n");
        if run.bold || run.italic {
            self.output.push_str("<w:rPr>\n");
            if run.bold {
                self.output.push_str("<w:b/>\n");
            }
            if run.italic {
                self.output.push_str("<w:i/>\n");
            }
            self.output.push_str("</w:rPr>\n");
        }
        self.output.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t>\n",
            escape_xml(&run.text)
        ));
        self.output.push_str("</w:r>\n");
    }

    /// Generate XML for a table
    fn generate_table(&mut self, table: &Table) {
        self.output.push_str("<w:tbl>\n");

        self.output.push_str("<w:tblPr>\n");
        let style = table
            .style_id
            .clone()
            .unwrap_or_else(|| self.style_map.get(crate::styles::ElementType::Table).to_string());
        self.output
            .push_str(&format!("<w:tblStyle w:val=\"{}\"/>\n", escape_xml(&style)));
        self.output
            .push_str("<w:tblW w:w=\"5000\" w:type=\"pct\"/>\n");
        self.output.push_str("</w:tblPr>\n");

        if table.columns > 0 {
            let width = TABLE_WIDTH / table.columns;
            self.output.push_str("<w:tblGrid>\n");
            for _ in 0..table.columns {
                self.output
                    .push_str(&format!("<w:gridCol w:w=\"{}\"/>\n", width));
            }
            self.output.push_str("</w:tblGrid>\n");
        }

        for row in &table.rows {
            self.output.push_str("<w:tr>\n");

            if row.is_header {
                self.output.push_str("<w:trPr>\n");
                self.output.push_str("<w:tblHeader/>\n");
                self.output.push_str("</w:trPr>\n");
            }

            for cell in &row.cells {
                self.output.push_str("<w:tc>\n");
                for para in &cell.paragraphs {
                    self.generate_paragraph(para);
                }
                // A cell needs at least one paragraph
                if cell.paragraphs.is_empty() {
                    self.output.push_str("<w:p/>\n");
                }
                self.output.push_str("</w:tc>\n");
            }

            self.output.push_str("</w:tr>\n");
        }

        self.output.push_str("</w:tbl>\n");
    }
}

fn content_types_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push('\n');
    xml.push_str(r#"  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push('\n');
    xml.push_str(r#"  <Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push('\n');
    for (part, content_type) in [
        (
            DOCUMENT_PART,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            STYLES_PART,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
        (
            NUMBERING_PART,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml",
        ),
        (
            CORE_PART,
            "application/vnd.openxmlformats-package.core-properties+xml",
        ),
    ] {
        xml.push_str(&format!(
            r#"  <Override PartName="/{}" ContentType="{}"/>"#,
            part, content_type
        ));
        xml.push('\n');
    }
    xml.push_str("</Types>");
    xml
}

fn core_properties_xml(title: Option<&str>) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    xml.push('\n');
    if let Some(title) = title {
        xml.push_str(&format!("<dc:title>{}</dc:title>\n", escape_xml(title)));
    }
    xml.push_str("<dc:creator>glossa</dc:creator>\n");
    xml.push_str("</cp:coreProperties>");
    xml
}

/// Render a parsed document as DOCX bytes
pub fn render_docx(doc: &ParsedDocument) -> Result<Vec<u8>> {
    render_docx_with_styles(doc, StyleMap::default())
}

/// Render a parsed document as DOCX bytes with a custom style mapping
pub fn render_docx_with_styles(doc: &ParsedDocument, style_map: StyleMap) -> Result<Vec<u8>> {
    let rich = convert_document_with_styles(doc, &style_map);
    let mut writer = DocxWriter::with_style_map(style_map);
    writer.set_title(doc.title.clone());
    writer.write(&rich)
}

/// Render a parsed document and write it to a file
pub fn write_docx<P: AsRef<Path>>(doc: &ParsedDocument, path: P) -> Result<()> {
    let bytes = render_docx(doc)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
