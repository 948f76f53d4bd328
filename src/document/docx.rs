// src/document/docx.rs
//! DOCX-backed document source.
//!
//! Reads the parts of an Office Open XML package needed for labeling:
//! - `word/document.xml`: body paragraphs and tables
//! - `word/_rels/document.xml.rels`: relationship id -> media part
//! - `word/styles.xml`: style id -> display name (optional)
//! - `word/media/*`: image bytes

use crate::document::model::{Block, Cell, DocumentSource, ImagePart, ImageRef, Row, Table};
use crate::utils::error::{DocumentError, ExtractError};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const STYLES_PART: &str = "word/styles.xml";

pub struct DocxDocument {
    path: PathBuf,
    blocks: Vec<Block>,
    tables: Vec<Table>,
    media_targets: HashMap<String, String>, // rel id -> "media/imageN.ext"
    media: HashMap<String, Vec<u8>>,        // "media/imageN.ext" -> bytes
}

impl DocxDocument {
    /// Opens and parses a DOCX file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        tracing::info!("Opening document: {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path, bytes)
    }

    /// Parses a DOCX package already held in memory. `path` is only used for naming.
    pub fn from_bytes<P: AsRef<Path>>(path: P, bytes: Vec<u8>) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let document_xml = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or_else(|| DocumentError::MissingPart(DOCUMENT_PART.to_string()))?;

        let media_targets = match read_part(&mut archive, RELS_PART)? {
            Some(xml) => parse_media_relationships(&xml)?,
            None => {
                tracing::warn!("No relationships part found; images cannot be resolved");
                HashMap::new()
            }
        };
        tracing::info!("Found {} image relationships in document", media_targets.len());

        let styles = match read_part(&mut archive, STYLES_PART)? {
            Some(xml) => parse_styles(&xml)?,
            None => StyleTable::default(),
        };

        let (blocks, tables) = parse_body(&document_xml, &styles)?;
        tracing::debug!("Parsed {} top-level paragraphs and {} tables", blocks.len(), tables.len());

        let mut media = HashMap::new();
        for target in media_targets.values() {
            if media.contains_key(target) {
                continue;
            }
            let part_name = format!("word/{}", target);
            match read_part_bytes(&mut archive, &part_name)? {
                Some(data) => {
                    media.insert(target.clone(), data);
                }
                None => tracing::warn!("Media part referenced but missing: {}", part_name),
            }
        }

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            blocks,
            tables,
            media_targets,
            media,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for DocxDocument {
    fn top_level_blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn tables(&self) -> &[Table] {
        &self.tables
    }

    fn resolve_image(&self, id: &str) -> Result<ImagePart, ExtractError> {
        let target = self
            .media_targets
            .get(id)
            .ok_or_else(|| ExtractError::ImageNotFound(id.to_string()))?;
        let bytes = self
            .media
            .get(target)
            .ok_or_else(|| ExtractError::ImageNotFound(format!("{} ({})", id, target)))?;
        Ok(ImagePart {
            part_name: target.clone(),
            bytes: bytes.clone(),
        })
    }
}

// --- Package helpers ---

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, DocumentError> {
    match read_part_bytes(archive, name)? {
        Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        None => Ok(None),
    }
}

fn read_part_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, DocumentError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    // Declared sizes are not trusted; the buffer grows as bytes arrive
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

fn parse_xml<'a>(part: &str, xml: &'a str) -> Result<Document<'a>, DocumentError> {
    Document::parse(xml).map_err(|source| DocumentError::Xml {
        part: part.to_string(),
        source,
    })
}

fn is_w<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(W_NS)
}

fn w_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| is_w(n, name))
}

/// Relationship id -> target for every relationship pointing into `media/`.
fn parse_media_relationships(xml: &str) -> Result<HashMap<String, String>, DocumentError> {
    let doc = parse_xml(RELS_PART, xml)?;
    let mut targets = HashMap::new();
    for rel in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
    {
        if let (Some(id), Some(target)) = (rel.attribute("Id"), rel.attribute("Target")) {
            if target.starts_with("media/") {
                targets.insert(id.to_string(), target.to_string());
            } else {
                tracing::trace!("Skipping non-media relationship {} -> {}", id, target);
            }
        }
    }
    Ok(targets)
}

#[derive(Debug, Default)]
struct StyleTable {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl StyleTable {
    fn name_for(&self, style_id: Option<&str>) -> Option<String> {
        match style_id {
            Some(id) => Some(self.names.get(id).cloned().unwrap_or_else(|| id.to_string())),
            None => self.default_paragraph.clone(),
        }
    }
}

fn parse_styles(xml: &str) -> Result<StyleTable, DocumentError> {
    let doc = parse_xml(STYLES_PART, xml)?;
    let mut table = StyleTable::default();
    for style in doc.descendants().filter(|n| is_w(n, "style")) {
        let Some(id) = style.attribute((W_NS, "styleId")) else {
            continue;
        };
        let name = w_children(style, "name")
            .next()
            .and_then(|n| n.attribute((W_NS, "val")))
            .unwrap_or(id)
            .to_string();

        let is_paragraph = style.attribute((W_NS, "type")) == Some("paragraph");
        let is_default = matches!(style.attribute((W_NS, "default")), Some("1") | Some("true"));
        if is_paragraph && is_default {
            table.default_paragraph = Some(name.clone());
        }
        table.names.insert(id.to_string(), name);
    }
    Ok(table)
}

fn parse_body(xml: &str, styles: &StyleTable) -> Result<(Vec<Block>, Vec<Table>), DocumentError> {
    let doc = parse_xml(DOCUMENT_PART, xml)?;
    let body = doc
        .descendants()
        .find(|n| is_w(n, "body"))
        .ok_or_else(|| DocumentError::MissingPart("w:body".to_string()))?;

    let mut blocks = Vec::new();
    let mut tables = Vec::new();
    for child in body.children().filter(|n| n.is_element()) {
        if is_w(&child, "p") {
            blocks.push(parse_paragraph(child, styles));
        } else if is_w(&child, "tbl") {
            tables.push(parse_table(child, styles));
        }
    }
    Ok((blocks, tables))
}

fn parse_table(tbl: Node, styles: &StyleTable) -> Table {
    let rows = w_children(tbl, "tr")
        .map(|tr| Row {
            cells: w_children(tr, "tc")
                .map(|tc| Cell {
                    blocks: w_children(tc, "p").map(|p| parse_paragraph(p, styles)).collect(),
                })
                .collect(),
        })
        .collect();
    Table { rows }
}

fn parse_paragraph(p: Node, styles: &StyleTable) -> Block {
    let mut text = String::new();
    for child in p.children().filter(|n| n.is_element()) {
        if is_w(&child, "r") {
            push_run_text(child, &mut text);
        } else if is_w(&child, "hyperlink") {
            for run in w_children(child, "r") {
                push_run_text(run, &mut text);
            }
        }
    }

    let style_id = w_children(p, "pPr")
        .next()
        .and_then(|ppr| w_children(ppr, "pStyle").next())
        .and_then(|ps| ps.attribute((W_NS, "val")));

    let images = p
        .descendants()
        .filter(|n| {
            n.is_element()
                && n.tag_name().name() == "blip"
                && n.tag_name().namespace() == Some(A_NS)
        })
        .filter_map(|blip| blip.attribute((R_NS, "embed")))
        .map(|id| ImageRef { id: id.to_string() })
        .collect();

    Block {
        text: text.trim().to_string(),
        style_name: styles.name_for(style_id),
        images,
    }
}

fn push_run_text(run: Node, out: &mut String) {
    for child in run.children().filter(|n| n.is_element()) {
        if is_w(&child, "t") {
            out.push_str(child.text().unwrap_or(""));
        } else if is_w(&child, "tab") {
            out.push('\t');
        } else if is_w(&child, "br") || is_w(&child, "cr") {
            out.push('\n');
        }
    }
}
