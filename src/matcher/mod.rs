// src/matcher/mod.rs
//! Re-matches extracted image files against an externally supplied metadata
//! list and renames them to the names that list prescribes.

use crate::extractors::labels;
use crate::storage::naming;
use crate::storage::{ItemFailure, OutputSink};
use crate::utils::error::{MatchError, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// One record of the metadata list. Only `filename` is read.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MetadataEntry {
    pub filename: String,
}

/// Reads the metadata list (a JSON array of objects with a `filename` field).
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<MetadataEntry>, MatchError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| MatchError::MetadataRead {
        path: path.display().to_string(),
        source,
    })?;
    let entries: Vec<MetadataEntry> =
        serde_json::from_str(&contents).map_err(|source| MatchError::MetadataParse {
            path: path.display().to_string(),
            source,
        })?;
    tracing::info!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Key -> final file stem, remembering insertion order. The first entry for a key wins.
#[derive(Debug, Default, Clone)]
pub struct RenameMapping {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl RenameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a key from every entry and keeps the first stem seen per key.
    pub fn from_metadata(entries: &[MetadataEntry]) -> Self {
        let mut mapping = Self::new();
        for entry in entries {
            match labels::derive_key(&entry.filename) {
                Some(key) => {
                    if !mapping.insert_if_absent(key.clone(), entry.filename.clone()) {
                        tracing::debug!("Duplicate key '{}' ignored for '{}'", key, entry.filename);
                    }
                }
                None => {
                    tracing::debug!("No key derivable from metadata entry '{}'", entry.filename)
                }
            }
        }
        tracing::info!("Built {} mapping keys", mapping.len());
        mapping
    }

    /// Inserts unless the key is already present. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, key: String, stem: String) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, stem));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.positions.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// What should happen to one existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenamePlan {
    Rename { old: String, new: String, key: String },
    AlreadyNamed { name: String, key: String },
    Unmatched { name: String, key: Option<String> },
    /// The mapped name would leave the images folder.
    Rejected { name: String, target: String, key: String },
}

#[derive(Debug, Default, Serialize)]
pub struct RenameReport {
    pub dry_run: bool,
    pub total: usize,
    pub renamed: Vec<String>,
    pub already_named: Vec<String>,
    pub unmatched: Vec<ItemFailure>,
    pub failed: Vec<ItemFailure>,
}

/// Sorted names of the image files directly inside `dir`.
pub fn list_image_files<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_image = Path::new(&name)
            .extension()
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// The mapped stem with the file's own extension.
fn target_name(stem: &str, old_name: &str) -> String {
    match Path::new(old_name).extension() {
        Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
        None => stem.to_string(),
    }
}

/// Decides, without touching the disk, what happens to each file.
pub fn plan_renames(file_names: &[String], mapping: &RenameMapping) -> Vec<RenamePlan> {
    file_names
        .iter()
        .map(|name| {
            let key = labels::derive_key(name);
            let stem = key.as_deref().and_then(|k| mapping.get(k));
            match (key, stem) {
                (Some(key), Some(stem)) => {
                    let new = target_name(stem, name);
                    if !naming::is_plain_file_name(&new) {
                        RenamePlan::Rejected { name: name.clone(), target: new, key }
                    } else if &new == name {
                        RenamePlan::AlreadyNamed { name: name.clone(), key }
                    } else {
                        RenamePlan::Rename { old: name.clone(), new, key }
                    }
                }
                (key, _) => RenamePlan::Unmatched { name: name.clone(), key },
            }
        })
        .collect()
}

/// Carries out a plan. Failures are recorded per file and never roll back
/// renames that already happened.
pub fn apply_renames<S: OutputSink + ?Sized>(plans: &[RenamePlan], sink: &S) -> RenameReport {
    summarize(plans, false, |old, new| sink.rename_file(old, new).map(|_| ()))
}

/// The report `apply_renames` would produce, without touching the disk.
pub fn dry_run_report(plans: &[RenamePlan]) -> RenameReport {
    summarize(plans, true, |_, _| Ok(()))
}

fn summarize<F>(plans: &[RenamePlan], dry_run: bool, mut rename: F) -> RenameReport
where
    F: FnMut(&str, &str) -> Result<(), StorageError>,
{
    let mut report = RenameReport {
        dry_run,
        total: plans.len(),
        ..RenameReport::default()
    };

    for plan in plans {
        match plan {
            RenamePlan::Rename { old, new, key } => match rename(old, new) {
                Ok(()) => {
                    if !dry_run {
                        tracing::info!("Renamed {} -> {} (key '{}')", old, new, key);
                    }
                    report.renamed.push(format!("{} -> {}", old, new));
                }
                Err(e) => {
                    tracing::warn!("Failed to rename {}: {}", old, e);
                    report.failed.push(ItemFailure { item: old.clone(), reason: e.to_string() });
                }
            },
            RenamePlan::AlreadyNamed { name, .. } => {
                tracing::debug!("{} already has its final name", name);
                report.already_named.push(name.clone());
            }
            RenamePlan::Unmatched { name, key } => {
                let reason = match key {
                    Some(k) => format!("key '{}' not in mapping", k),
                    None => "no key derived".to_string(),
                };
                tracing::warn!("No mapping for {}: {}", name, reason);
                report.unmatched.push(ItemFailure { item: name.clone(), reason });
            }
            RenamePlan::Rejected { name, target, key } => {
                let reason =
                    format!("mapped name '{}' for key '{}' is not a plain file name", target, key);
                tracing::warn!("Refusing to rename {}: {}", name, reason);
                report.failed.push(ItemFailure { item: name.clone(), reason });
            }
        }
    }

    report
}
