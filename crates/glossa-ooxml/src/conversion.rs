//! Conversion from the glossa document tree to the rich document model
//!
//! Read-only over the tree. Each node kind maps to styled paragraphs or a
//! table; lists, tables, blockquotes and headings consume their whole
//! subtree as flattened text, while other containers recurse.

use std::cell::Cell;

use glossa_ast::{needs_separator, DocumentNode, NodeKind, ParsedDocument, TextSegment, TextType};
use tracing::debug;

use crate::document::{Block, NumberingRef, Paragraph, RichDocument, Run, Table, TableCell, TableRow};
use crate::styles::{ElementType, StyleMap, NUM_BULLET, NUM_DECIMAL};

/// Left and right indent for quotations, in twips (half an inch)
pub const QUOTE_INDENT: u32 = 720;

/// Context for conversion, holding the style mapping
pub struct ConversionContext<'a> {
    /// Style IDs for each element role
    pub styles: &'a StyleMap,
    /// Numbering instance for the next ordered list
    next_ordered: Cell<u32>,
}

impl<'a> ConversionContext<'a> {
    /// Create a context with a style mapping
    pub fn new(styles: &'a StyleMap) -> Self {
        Self {
            styles,
            next_ordered: Cell::new(NUM_DECIMAL),
        }
    }

    /// Each ordered list gets its own numbering instance so it starts at 1
    fn ordered_num_id(&self) -> u32 {
        let id = self.next_ordered.get();
        self.next_ordered.set(id + 1);
        id
    }

    fn paragraph(&self, element: ElementType) -> Paragraph {
        Paragraph::styled(self.styles.get(element))
    }
}

/// Trait for converting glossa tree types to rich document types
pub trait ToRich {
    /// The rich type this converts to
    type Output;

    /// Convert to rich representation
    fn to_rich(&self, ctx: &ConversionContext) -> Self::Output;
}

impl ToRich for TextSegment {
    type Output = Run;

    fn to_rich(&self, _ctx: &ConversionContext) -> Self::Output {
        Run {
            text: self.text.clone(),
            bold: self.formatting.bold,
            // Latin is always set in italics
            italic: self.formatting.italic || self.text_type == TextType::Latin,
        }
    }
}

impl ToRich for DocumentNode {
    type Output = Vec<Block>;

    fn to_rich(&self, ctx: &ConversionContext) -> Self::Output {
        let mut blocks = Vec::new();
        convert_node(self, ctx, &mut blocks);
        blocks
    }
}

impl ToRich for ParsedDocument {
    type Output = RichDocument;

    fn to_rich(&self, ctx: &ConversionContext) -> Self::Output {
        let mut blocks = front_matter(self, ctx);
        for node in &self.nodes {
            convert_node(node, ctx, &mut blocks);
        }
        debug!(
            title = %self.title,
            nodes = self.nodes.len(),
            blocks = blocks.len(),
            "Converted document to rich form"
        );
        RichDocument { blocks }
    }
}

/// Title paragraph and source line
fn front_matter(doc: &ParsedDocument, ctx: &ConversionContext) -> Vec<Block> {
    let mut title = ctx.paragraph(ElementType::Title).with_run(Run::new(doc.title.clone()));
    title.centered = true;

    let mut source = ctx.paragraph(ElementType::Source).with_run(Run::italic(format!(
        "Original file: {}",
        doc.original_filename.as_deref().unwrap_or("unknown")
    )));
    source.centered = true;

    vec![Block::Paragraph(title), Block::Paragraph(source)]
}

fn convert_node(node: &DocumentNode, ctx: &ConversionContext, out: &mut Vec<Block>) {
    if let Some(level) = node.kind.heading_level() {
        let text = node.plain_text();
        if !text.is_empty() {
            out.push(Block::Paragraph(
                Paragraph::styled(ctx.styles.heading(level)).with_run(Run::new(text)),
            ));
        }
        return;
    }

    match node.kind {
        NodeKind::Paragraph => {
            if let Some(para) = segment_paragraph(node, ctx, true) {
                out.push(Block::Paragraph(para));
            }
            for child in &node.children {
                convert_node(child, ctx, out);
            }
        }
        NodeKind::OrderedList | NodeKind::UnorderedList => {
            convert_list(node, ctx, out);
        }
        NodeKind::Table => {
            if let Some(table) = convert_table(node, ctx) {
                out.push(Block::Table(table));
            }
        }
        NodeKind::Blockquote => {
            let text = node.plain_text();
            if !text.is_empty() {
                let mut para = ctx.paragraph(ElementType::Quote).with_run(Run::italic(text));
                para.indent = Some(QUOTE_INDENT);
                out.push(Block::Paragraph(para));
            }
        }
        _ => {
            if let Some(para) = segment_paragraph(node, ctx, false) {
                out.push(Block::Paragraph(para));
            }
            for child in &node.children {
                convert_node(child, ctx, out);
            }
        }
    }
}

/// Paragraph from a node's own runs, with its section label in bold
fn segment_paragraph(
    node: &DocumentNode,
    ctx: &ConversionContext,
    with_label: bool,
) -> Option<Paragraph> {
    let mut segments = node.text_segments.as_slice();
    let label = node.section_number.as_deref().filter(|_| with_label);

    if segments.is_empty() && label.is_none() {
        return None;
    }

    let mut para = ctx.paragraph(ElementType::Paragraph);
    let mut prev: Option<&str> = None;

    if let Some(label) = label {
        para.runs.push(Run::bold(format!("{}. ", label)));
        prev = Some(" ");
        // The marker run itself is already covered by the label
        if segments
            .first()
            .is_some_and(|s| s.text.trim().trim_end_matches('.') == label)
        {
            segments = &segments[1..];
        }
    }

    for segment in segments {
        let mut run = segment.to_rich(ctx);
        if prev.is_some_and(|p| needs_separator(p, &segment.text)) {
            run.text.insert(0, ' ');
        }
        prev = Some(segment.text.as_str());
        para.runs.push(run);
    }

    Some(para)
}

fn convert_list(node: &DocumentNode, ctx: &ConversionContext, out: &mut Vec<Block>) {
    let ordered = node.kind == NodeKind::OrderedList;
    let numbering = NumberingRef {
        num_id: if ordered {
            ctx.ordered_num_id()
        } else {
            NUM_BULLET
        },
        ilvl: 0,
    };

    for item in node.children.iter().filter(|c| c.kind == NodeKind::ListItem) {
        let text = item.plain_text();
        if text.is_empty() {
            continue;
        }
        let mut para = Paragraph::styled(ctx.styles.list(ordered)).with_run(Run::new(text));
        para.numbering = Some(numbering);
        out.push(Block::Paragraph(para));
    }
}

fn convert_table(node: &DocumentNode, ctx: &ConversionContext) -> Option<Table> {
    let rows: Vec<&DocumentNode> = node
        .children
        .iter()
        .filter(|c| c.kind == NodeKind::TableRow)
        .collect();

    let columns = row_cells(rows.first()?).len();
    if columns == 0 {
        debug!("Skipping table with an empty first row");
        return None;
    }

    let rows = rows
        .iter()
        .map(|row| {
            let cells = row_cells(row);
            let is_header = cells.iter().all(|c| c.kind == NodeKind::TableHeader);
            let mut converted: Vec<TableCell> = cells
                .iter()
                .take(columns)
                .map(|cell| {
                    let text = cell.plain_text();
                    let mut para = Paragraph::default();
                    if !text.is_empty() {
                        para.runs.push(if cell.kind == NodeKind::TableHeader {
                            Run::bold(text)
                        } else {
                            Run::new(text)
                        });
                    }
                    TableCell {
                        paragraphs: vec![para],
                    }
                })
                .collect();
            // Short rows are padded to the grid
            converted.resize_with(columns, || TableCell {
                paragraphs: vec![Paragraph::default()],
            });
            TableRow {
                cells: converted,
                is_header: is_header && !cells.is_empty(),
            }
        })
        .collect();

    Some(Table {
        style_id: Some(ctx.styles.get(ElementType::Table).to_string()),
        columns,
        rows,
    })
}

fn row_cells(row: &DocumentNode) -> Vec<&DocumentNode> {
    row.children.iter().filter(|c| c.kind.is_cell()).collect()
}

/// Convert a document with the default style mapping
pub fn convert_document(doc: &ParsedDocument) -> RichDocument {
    convert_document_with_styles(doc, &StyleMap::default())
}

/// Convert a document with a custom style mapping
pub fn convert_document_with_styles(doc: &ParsedDocument, styles: &StyleMap) -> RichDocument {
    let ctx = ConversionContext::new(styles);
    doc.to_rich(&ctx)
}
