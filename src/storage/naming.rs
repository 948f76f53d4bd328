// src/storage/naming.rs
use crate::extractors::labels::Label;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path};

pub const DEFAULT_MARKER: &str = "- KNTT ";
pub const DEFAULT_EXTENSION: &str = ".png";

static RUOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*ruot").expect("ruot pattern must compile"));

/// Settings that shape output file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    pub marker: String,            // Appended to the trimmed document name
    pub default_extension: String, // Used when the image part has none
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            default_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// Document file stem, cut before "ruot" (any case), trimmed, plus the marker.
pub fn base_name<P: AsRef<Path>>(document_path: P, config: &NamingConfig) -> String {
    let stem = document_path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cut = match RUOT_RE.find(&stem) {
        Some(m) => stem[..m.start()].trim(),
        None => stem.as_str(),
    };
    format!("{}{}", cut, config.marker)
}

/// Lower-cased extension of an image part name, with the leading dot.
pub fn image_extension(part_name: &str, config: &NamingConfig) -> String {
    Path::new(part_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_else(|| config.default_extension.clone())
}

/// "{seq:02} - {base} - {label}{ext}"
pub fn build_filename(sequence: usize, base_name: &str, label: &Label, extension: &str) -> String {
    format!("{:02} - {} - {}{}", sequence, base_name, label, extension)
}

/// True when `name` names an entry directly inside a folder: a single normal
/// path component with no separator of either platform.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_cuts_at_ruot() {
        let config = NamingConfig::default();
        assert_eq!(
            base_name(
                "/in/SBT Toan 6 tap 1 ruot(TB2025)_KNTT (14.3.2025) (1)_converted.docx",
                &config
            ),
            "SBT Toan 6 tap 1- KNTT "
        );
        assert_eq!(base_name("Toan 7 RUOT.docx", &config), "Toan 7- KNTT ");
        assert_eq!(base_name("Toan 8.docx", &config), "Toan 8- KNTT ");
    }

    #[test]
    fn test_base_name_custom_marker() {
        let config = NamingConfig { marker: " CTST".to_string(), ..NamingConfig::default() };
        assert_eq!(base_name("Ly 6 ruot.docx", &config), "Ly 6 CTST");
    }

    #[test]
    fn test_image_extension() {
        let config = NamingConfig::default();
        assert_eq!(image_extension("media/image1.JPEG", &config), ".jpeg");
        assert_eq!(image_extension("media/image2.emf", &config), ".emf");
        assert_eq!(image_extension("media/image3", &config), ".png");
    }

    #[test]
    fn test_build_filename() {
        let base = "SBT Toan 6 tap 1- KNTT ";
        assert_eq!(
            build_filename(7, base, &Label::ExerciseIndex("3.5".to_string()), ".png"),
            "07 - SBT Toan 6 tap 1- KNTT  - Bài 3.5.png"
        );
        assert_eq!(
            build_filename(123, "Book", &Label::Unknown, ".jpg"),
            "123 - Book - Không xác định.jpg"
        );
        assert_eq!(
            build_filename(1, "Book", &Label::Title("CHƯƠNG I".to_string()), ".png"),
            "01 - Book - CHƯƠNG I.png"
        );
    }

    #[test]
    fn test_is_plain_file_name() {
        assert!(is_plain_file_name("T6_Bài 1.1.png"));
        assert!(is_plain_file_name("01 - Book - CHƯƠNG MỘT RẤT DÀI....png"));
        assert!(!is_plain_file_name("../outside/Bài 1.1.png"));
        assert!(!is_plain_file_name("sub/Bài 1.1.png"));
        assert!(!is_plain_file_name("..\\Bài 1.1.png"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name("/abs.png"));
        assert!(!is_plain_file_name(""));
    }
}
