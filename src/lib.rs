// src/lib.rs
//! Labels the images embedded in a structured document by the chapter title,
//! exercise number or figure number that precedes them, writes them out under
//! deterministic names, and later renames them against a metadata list.

pub mod document;
pub mod extractors;
pub mod matcher;
pub mod storage;
pub mod utils;
