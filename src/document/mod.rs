// src/document/mod.rs
pub mod docx;
pub mod model;

pub use docx::DocxDocument;
pub use model::{Block, BlockLocation, DocumentSource, ImagePart, ImageRef};
