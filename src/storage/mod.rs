// src/storage/mod.rs
pub mod naming;

use crate::extractors::images::{ImageCollection, ImageFailure};
use crate::extractors::labels;
use crate::utils::error::StorageError;
use naming::NamingConfig;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for extracted images and renames.
pub trait OutputSink {
    /// Writes `bytes` under `file_name`, replacing any existing file.
    fn write_file(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError>;

    /// Renames `old_name` to `new_name`; refuses to replace a different existing file.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<PathBuf, StorageError>;
}

/// A skipped or failed item, as enumerated in run summaries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub item: String,
    pub reason: String,
}

impl From<&ImageFailure> for ItemFailure {
    fn from(f: &ImageFailure) -> Self {
        Self {
            item: format!("{} ({})", f.image_id, f.location),
            reason: f.reason.clone(),
        }
    }
}

/// Outcome of writing a collection to disk.
#[derive(Debug, Default, Serialize)]
pub struct ExtractionReport {
    pub base_name: String,
    pub total: usize,
    pub saved: Vec<String>,
    pub failures: Vec<ItemFailure>,
    pub skipped: Vec<ItemFailure>,
    pub labels_used: Vec<String>,
}

/// One image as the preview lists it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlannedImage {
    pub sequence: usize,
    pub file_name: String,
    pub context: String,
}

/// What an extraction would write, computed without touching the disk.
#[derive(Debug, Default, Serialize)]
pub struct PreviewReport {
    pub base_name: String,
    pub images: Vec<PlannedImage>,
    pub unresolved: Vec<ItemFailure>,
    pub skipped: Vec<ItemFailure>,
    pub labels_used: Vec<String>,
}

impl PreviewReport {
    pub fn from_collection(
        collection: &ImageCollection,
        base_name: &str,
        config: &NamingConfig,
    ) -> Self {
        let images = collection
            .images
            .iter()
            .map(|image| {
                let extension = naming::image_extension(&image.part.part_name, config);
                PlannedImage {
                    sequence: image.sequence,
                    file_name: naming::build_filename(
                        image.sequence,
                        base_name,
                        &image.label,
                        &extension,
                    ),
                    context: image.context.clone(),
                }
            })
            .collect();

        Self {
            base_name: base_name.to_string(),
            images,
            unresolved: collection.failures.iter().map(ItemFailure::from).collect(),
            skipped: collection.skipped.iter().map(ItemFailure::from).collect(),
            labels_used: labels::summarize_labels(collection.images.iter().map(|i| &i.label)),
        }
    }
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Names and writes every collected image; per-image failures are
    /// recorded and do not stop the run.
    pub fn save_images(
        &self,
        collection: &ImageCollection,
        base_name: &str,
        config: &NamingConfig,
    ) -> ExtractionReport {
        let mut report = ExtractionReport {
            base_name: base_name.to_string(),
            total: collection.images.len() + collection.failures.len(),
            failures: collection.failures.iter().map(ItemFailure::from).collect(),
            skipped: collection.skipped.iter().map(ItemFailure::from).collect(),
            labels_used: labels::summarize_labels(collection.images.iter().map(|i| &i.label)),
            ..ExtractionReport::default()
        };

        for image in &collection.images {
            let extension = naming::image_extension(&image.part.part_name, config);
            let file_name =
                naming::build_filename(image.sequence, base_name, &image.label, &extension);

            match self.write_file(&file_name, &image.part.bytes) {
                Ok(_) => {
                    tracing::info!("Saved {}", file_name);
                    if !image.context.trim().is_empty() {
                        tracing::debug!("    Context: {}", image.context);
                    }
                    report.saved.push(file_name);
                }
                Err(e) => {
                    tracing::error!("Failed to save image {}: {}", image.sequence, e);
                    report.failures.push(ItemFailure {
                        item: file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

impl OutputSink for StorageManager {
    fn write_file(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let file_path = self.entry_path(file_name)?;
        fs::write(&file_path, bytes).map_err(StorageError::IoError)?;
        Ok(file_path)
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<PathBuf, StorageError> {
        let old_path = self.entry_path(old_name)?;
        let new_path = self.entry_path(new_name)?;
        if old_path == new_path {
            return Ok(new_path);
        }
        if new_path.exists() {
            return Err(StorageError::FileExists(new_path.display().to_string()));
        }
        fs::rename(&old_path, &new_path).map_err(StorageError::IoError)?;
        Ok(new_path)
    }
}

impl StorageManager {
    /// Path of a file directly inside the base directory; nested or escaping names are refused.
    fn entry_path(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        if !naming::is_plain_file_name(file_name) {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        Ok(self.base_dir.join(file_name))
    }
}

/// Saves a run report as pretty JSON, stamped with the generation time.
pub fn save_report<T: Serialize>(
    path: &Path,
    kind: &str,
    report: &T,
) -> Result<PathBuf, StorageError> {
    let document = serde_json::json!({
        "kind": kind,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "report": report,
    });

    let contents = serde_json::to_string_pretty(&document)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(StorageError::IoError)?;
    }
    fs::write(path, contents).map_err(StorageError::IoError)?;

    tracing::info!("Saved report to {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::{BlockLocation, ImagePart};
    use crate::extractors::images::CollectedImage;
    use crate::extractors::labels::Label;

    fn image(sequence: usize, label: Label, part_name: &str) -> CollectedImage {
        CollectedImage {
            sequence,
            image_id: format!("rId{}", sequence),
            label,
            context: String::new(),
            location: BlockLocation::Body { paragraph: sequence },
            part: ImagePart { part_name: part_name.to_string(), bytes: vec![sequence as u8] },
        }
    }

    #[test]
    fn test_save_images_names_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("images")).unwrap();

        let collection = ImageCollection {
            images: vec![
                image(1, Label::Title("CHƯƠNG I".into()), "media/image1.PNG"),
                image(2, Label::FigureIndex("1.1".into()), "media/image2.jpeg"),
            ],
            failures: vec![ImageFailure {
                image_id: "rId9".into(),
                location: BlockLocation::Body { paragraph: 3 },
                reason: "Image not found for relationship id: rId9".into(),
            }],
            skipped: vec![ImageFailure {
                image_id: "rId4".into(),
                location: BlockLocation::Body { paragraph: 0 },
                reason: "embedded in title block".into(),
            }],
        };

        let report = storage.save_images(&collection, "Book- KNTT ", &NamingConfig::default());
        assert_eq!(
            report.saved,
            vec!["01 - Book- KNTT  - CHƯƠNG I.png", "02 - Book- KNTT  - Hình 1.1.jpeg"]
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].item, "rId9 (paragraph 4)");
        assert_eq!(report.labels_used, vec!["CHƯƠNG I", "Hình 1.1"]);
        assert_eq!(report.skipped[0].item, "rId4 (paragraph 1)");

        let written =
            fs::read(storage.base_dir().join("02 - Book- KNTT  - Hình 1.1.jpeg")).unwrap();
        assert_eq!(written, vec![2u8]);
    }

    #[test]
    fn test_preview_report_matches_saved_names() {
        let collection = ImageCollection {
            images: vec![image(1, Label::Unknown, "media/image1.gif")],
            ..ImageCollection::default()
        };
        let preview =
            PreviewReport::from_collection(&collection, "Book", &NamingConfig::default());
        assert_eq!(
            preview.images,
            vec![PlannedImage {
                sequence: 1,
                file_name: "01 - Book - Không xác định.gif".into(),
                context: String::new(),
            }]
        );
        assert_eq!(preview.labels_used, vec!["Không xác định"]);
        assert!(preview.unresolved.is_empty());
    }

    #[test]
    fn test_names_outside_base_dir_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("images")).unwrap();
        storage.write_file("a.png", b"x").unwrap();

        let err = storage.rename_file("a.png", "../outside/a.png").unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));
        assert!(storage.base_dir().join("a.png").exists());
        assert!(!dir.path().join("outside").exists());

        let err = storage.write_file("../b.png", b"y").unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));
        assert!(!dir.path().join("b.png").exists());
    }

    #[test]
    fn test_repeated_label_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        storage.write_file("a.png", b"first").unwrap();
        storage.write_file("a.png", b"second").unwrap();
        assert_eq!(fs::read(dir.path().join("a.png")).unwrap(), b"second");
    }

    #[test]
    fn test_rename_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        storage.write_file("old.png", b"x").unwrap();
        storage.write_file("taken.png", b"y").unwrap();

        let err = storage.rename_file("old.png", "taken.png").unwrap_err();
        assert!(matches!(err, StorageError::FileExists(_)));

        let same = storage.rename_file("old.png", "old.png").unwrap();
        assert!(same.exists());

        let moved = storage.rename_file("old.png", "new.png").unwrap();
        assert!(moved.exists());
        assert!(!dir.path().join("old.png").exists());

        let missing = storage.rename_file("nope.png", "other.png").unwrap_err();
        assert!(matches!(missing, StorageError::IoError(_)));
    }

    #[test]
    fn test_save_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.json");
        let report = ExtractionReport { base_name: "Book".into(), total: 0, ..Default::default() };

        save_report(&path, "extract", &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "extract");
        assert_eq!(value["report"]["base_name"], "Book");
        assert!(value["generated_at"].as_str().is_some());
    }
}
