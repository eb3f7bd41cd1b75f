//! Rich document model and `word/document.xml` reader
//!
//! The model is the intermediate form between the glossa tree and
//! WordprocessingML: a flat sequence of styled paragraphs and tables.
//! [`RichDocument::parse`] reads the same shape back from a generated
//! package.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// A rich document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichDocument {
    /// Body blocks
    pub blocks: Vec<Block>,
}

/// Block-level elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),
    /// A table
    Table(Table),
}

/// A paragraph with its runs and style
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Style ID (references styles.xml)
    pub style_id: Option<String>,
    /// Text runs
    pub runs: Vec<Run>,
    /// List numbering
    pub numbering: Option<NumberingRef>,
    /// Left and right indentation in twips
    pub indent: Option<u32>,
    /// Centered alignment
    pub centered: bool,
}

/// A text run with formatting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    /// The text content
    pub text: String,
    /// Whether the text is bold
    pub bold: bool,
    /// Whether the text is italic
    pub italic: bool,
}

/// Reference to a numbering definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    /// Numbering ID
    pub num_id: u32,
    /// Indent level (0-based)
    pub ilvl: u32,
}

/// A table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Table style ID
    pub style_id: Option<String>,
    /// Number of grid columns
    pub columns: usize,
    /// Table rows
    pub rows: Vec<TableRow>,
}

/// A table row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    /// Cells in this row
    pub cells: Vec<TableCell>,
    /// Whether this is a header row
    pub is_header: bool,
}

/// A table cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    /// Paragraphs in this cell
    pub paragraphs: Vec<Paragraph>,
}

impl Run {
    /// Plain run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Bold run
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::new(text)
        }
    }

    /// Italic run
    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            italic: true,
            ..Self::new(text)
        }
    }
}

impl Paragraph {
    /// Empty paragraph with a style
    pub fn styled(style_id: impl Into<String>) -> Self {
        Self {
            style_id: Some(style_id.into()),
            ..Default::default()
        }
    }

    /// Append a run
    pub fn with_run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    /// Concatenated run text
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph has no visible text
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

impl TableCell {
    /// Cell text, paragraphs joined by newlines
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RichDocument {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// All paragraphs, including those inside table cells
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().flat_map(block_paragraphs)
    }

    /// Tables in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// Document text, one paragraph per line
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse a document from `word/document.xml` bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // Keep whitespace: runs may start with a separating space
        reader.config_mut().trim_text(false);

        let mut blocks = Vec::new();
        let mut buf = Vec::new();

        let mut para: Option<Paragraph> = None;
        let mut run: Option<Run> = None;
        let mut table: Option<Table> = None;
        let mut row: Option<TableRow> = None;
        let mut cell: Option<TableCell> = None;
        let mut in_text = false;
        let mut saw_body = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"body" => saw_body = true,
                    b"p" => para = Some(Paragraph::default()),
                    b"r" if para.is_some() => run = Some(Run::default()),
                    b"t" if run.is_some() => in_text = true,
                    b"tbl" => table = Some(Table::default()),
                    b"tr" if table.is_some() => row = Some(TableRow::default()),
                    b"tc" if row.is_some() => cell = Some(TableCell::default()),
                    _ => {
                        apply_property(e, &mut para, &mut run, &mut table, &mut row);
                    }
                },
                Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"body" => saw_body = true,
                    b"p" => {
                        let empty = Paragraph::default();
                        match cell.as_mut() {
                            Some(c) => c.paragraphs.push(empty),
                            None => blocks.push(Block::Paragraph(empty)),
                        }
                    }
                    _ => apply_property(e, &mut para, &mut run, &mut table, &mut row),
                },
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        if let Some(r) = run.as_mut() {
                            let text = e.unescape().map_err(OoxmlError::Xml)?;
                            r.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"r" => {
                        if let (Some(r), Some(p)) = (run.take(), para.as_mut()) {
                            p.runs.push(r);
                        }
                    }
                    b"p" => {
                        if let Some(p) = para.take() {
                            match cell.as_mut() {
                                Some(c) => c.paragraphs.push(p),
                                None => blocks.push(Block::Paragraph(p)),
                            }
                        }
                    }
                    b"tc" => {
                        if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                            r.cells.push(c);
                        }
                    }
                    b"tr" => {
                        if let (Some(r), Some(t)) = (row.take(), table.as_mut()) {
                            t.rows.push(r);
                        }
                    }
                    b"tbl" => {
                        if let Some(t) = table.take() {
                            blocks.push(Block::Table(t));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        if !saw_body {
            return Err(OoxmlError::InvalidStructure(
                "document has no w:body element".to_string(),
            ));
        }

        Ok(Self { blocks })
    }
}

fn block_paragraphs(block: &Block) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
    match block {
        Block::Paragraph(p) => Box::new(std::iter::once(p)),
        Block::Table(t) => Box::new(
            t.rows
                .iter()
                .flat_map(|r| r.cells.iter())
                .flat_map(|c| c.paragraphs.iter()),
        ),
    }
}

/// Record a property element on whichever container is open
fn apply_property(
    e: &BytesStart,
    para: &mut Option<Paragraph>,
    run: &mut Option<Run>,
    table: &mut Option<Table>,
    row: &mut Option<TableRow>,
) {
    match e.local_name().as_ref() {
        b"b" => {
            if let Some(r) = run.as_mut() {
                r.bold = is_on(e);
            }
        }
        b"i" => {
            if let Some(r) = run.as_mut() {
                r.italic = is_on(e);
            }
        }
        b"pStyle" => {
            if let Some(p) = para.as_mut() {
                p.style_id = get_attr(e, b"w:val");
            }
        }
        b"jc" => {
            if let Some(p) = para.as_mut() {
                p.centered = get_attr(e, b"w:val").as_deref() == Some("center");
            }
        }
        b"ind" => {
            if let Some(p) = para.as_mut() {
                p.indent = get_attr(e, b"w:left").and_then(|v| v.parse().ok());
            }
        }
        b"numId" => {
            if let Some(p) = para.as_mut() {
                let num_id = get_attr(e, b"w:val").and_then(|v| v.parse().ok()).unwrap_or(0);
                let ilvl = p.numbering.map(|n| n.ilvl).unwrap_or(0);
                p.numbering = Some(NumberingRef { num_id, ilvl });
            }
        }
        b"ilvl" => {
            if let Some(p) = para.as_mut() {
                let ilvl = get_attr(e, b"w:val").and_then(|v| v.parse().ok()).unwrap_or(0);
                let num_id = p.numbering.map(|n| n.num_id).unwrap_or(0);
                p.numbering = Some(NumberingRef { num_id, ilvl });
            }
        }
        b"tblStyle" => {
            if let Some(t) = table.as_mut() {
                t.style_id = get_attr(e, b"w:val");
            }
        }
        b"gridCol" => {
            if let Some(t) = table.as_mut() {
                t.columns += 1;
            }
        }
        b"tblHeader" => {
            if let Some(r) = row.as_mut() {
                r.is_header = true;
            }
        }
        _ => {}
    }
}

/// Toggle properties are on unless `w:val` says otherwise
fn is_on(e: &BytesStart) -> bool {
    !matches!(get_attr(e, b"w:val").as_deref(), Some("0" | "false" | "off"))
}

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}
