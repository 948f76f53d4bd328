// src/document/model.rs
use crate::utils::error::ExtractError;
use std::fmt;

/// A paragraph-level unit of text, possibly carrying embedded images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub text: String,               // Trimmed plain text of the paragraph
    pub style_name: Option<String>, // Display name of the paragraph style, if known
    pub images: Vec<ImageRef>,      // Embedded images in document order
}

impl Block {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style_name: impl Into<String>) -> Self {
        self.style_name = Some(style_name.into());
        self
    }

    pub fn with_image(mut self, id: impl Into<String>) -> Self {
        self.images.push(ImageRef { id: id.into() });
        self
    }
}

/// Opaque link from a block to image bytes stored elsewhere in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: String, // Relationship id, e.g. "rId7"
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub blocks: Vec<Block>,
}

/// Bytes of an embedded image plus the package part it was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub part_name: String, // e.g. "media/image3.jpeg"
    pub bytes: Vec<u8>,
}

/// Where a block sits in the document, for logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLocation {
    Body { paragraph: usize },
    Table { table: usize, row: usize, cell: usize, paragraph: usize },
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockLocation::Body { paragraph } => write!(f, "paragraph {}", paragraph + 1),
            BlockLocation::Table { table, row, cell, paragraph } => write!(
                f,
                "table {} row {} cell {} paragraph {}",
                table + 1,
                row + 1,
                cell + 1,
                paragraph + 1
            ),
        }
    }
}

/// A finished structured document the labeling pass can walk.
pub trait DocumentSource {
    fn top_level_blocks(&self) -> &[Block];
    fn tables(&self) -> &[Table];
    fn resolve_image(&self, id: &str) -> Result<ImagePart, ExtractError>;
}

/// Yields every block in labeling order: all top-level blocks, then each
/// table's rows, cells and cell blocks.
pub fn blocks_in_order<'a, D: DocumentSource + ?Sized>(
    doc: &'a D,
) -> impl Iterator<Item = (BlockLocation, &'a Block)> + 'a {
    let body = doc
        .top_level_blocks()
        .iter()
        .enumerate()
        .map(|(paragraph, block)| (BlockLocation::Body { paragraph }, block));

    let tables = doc.tables().iter().enumerate().flat_map(|(t, table)| {
        table.rows.iter().enumerate().flat_map(move |(r, row)| {
            row.cells.iter().enumerate().flat_map(move |(c, cell)| {
                cell.blocks.iter().enumerate().map(move |(p, block)| {
                    (
                        BlockLocation::Table { table: t, row: r, cell: c, paragraph: p },
                        block,
                    )
                })
            })
        })
    });

    body.chain(tables)
}

/// Plain in-memory document, used for hand-built fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pub blocks: Vec<Block>,
    pub tables: Vec<Table>,
    pub images: std::collections::HashMap<String, ImagePart>,
}

impl DocumentSource for MemoryDocument {
    fn top_level_blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn tables(&self) -> &[Table] {
        &self.tables
    }

    fn resolve_image(&self, id: &str) -> Result<ImagePart, ExtractError> {
        self.images
            .get(id)
            .cloned()
            .ok_or_else(|| ExtractError::ImageNotFound(id.to_string()))
    }
}
