// src/extractors/labels.rs
//! Label grammar shared by the image collector and the metadata matcher.
//!
//! Everything here is a pure function of its input text, so a label produced
//! while extracting and a key derived later from the written file name agree.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// --- Constants ---
const TITLE_MAX_CHARS: usize = 100;
const CLEAN_TITLE_MAX_CHARS: usize = 50;
const CLEAN_TITLE_KEEP_CHARS: usize = 47;
const STYLE_TITLE_KEYWORDS: [&str; 3] = ["heading", "title", "header"];

pub const FIGURE_WORD: &str = "Hình";
pub const EXERCISE_WORD: &str = "Bài";
pub const UNKNOWN_DISPLAY: &str = "Không xác định";

// --- Regex Patterns (Lazy Static) ---
static TITLE_TEXT_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[A-Z][^a-z]*$",       // All caps: "PHÉP NHÂN VÀ PHÉP CHIA SỐ TỰ NHIÊN"
        r"^[A-Z]\.\s*[A-Z]",      // "A. KIẾN THỨC CẦN NHỚ"
        r"^[IVX]+\.\s*[A-Z]",     // "I. GIỚI THIỆU"
        r"^\d+\.\s*[A-Z]",        // "1. Tập hợp"
        r"^BÀI\s*$",              // "BÀI" on its own line
        r"^CHƯƠNG\s+[IVX\d]",     // "CHƯƠNG I", "CHƯƠNG 1"
    ]
    .iter()
    .map(|pat| Regex::new(pat).expect("title pattern must compile"))
    .collect()
});

static TITLE_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("title strip pattern must compile"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));

static FIGURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Hình\s+(\d+\.\d+)").expect("figure pattern must compile"));
static FIGURE_ABBREV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"H\.(\d+\.\d+)").expect("figure abbreviation pattern must compile"));
static NUMERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.\d+)").expect("numeral pattern must compile"));
static EXERCISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bài\s+(\d+\.\d+)").expect("exercise pattern must compile"));

/// Fixed key-phrase vocabulary, tried in order. The second field is the
/// canonical key when the matched text is an alias.
static SPECIAL_KEY_RE: Lazy<Vec<(Regex, Option<&'static str>)>> = Lazy::new(|| {
    [
        (r"A\. KIẾN THỨC CẦN NHỚ", Some("KIẾN THỨC CẦN NHỚ")),
        (r"KIẾN THỨC CẦN NHỚ", None),
        (r"SƠ ĐỒ TỔNG KẾT CHƯƠNG [IVX]+", None),
        (r"Lời giải Bài \d+\.\d+", None),
        (r"Bìa sách", None),
    ]
    .into_iter()
    .map(|(pat, canonical)| {
        let re = Regex::new(pat).expect("key phrase pattern must compile");
        (re, canonical)
    })
    .collect()
});

// --- Data Structures ---

/// Contextual tag attached to an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    FigureIndex(String),   // "4.22" -> "Hình 4.22"
    ExerciseIndex(String), // "3.5"  -> "Bài 3.5"
    Title(String),         // Already cleaned
    Unknown,
}

impl Label {
    /// Grouping used when summarizing labels: titles, then figures, then exercises.
    fn summary_rank(&self) -> u8 {
        match self {
            Label::Title(_) | Label::Unknown => 0,
            Label::FigureIndex(_) => 1,
            Label::ExerciseIndex(_) => 2,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::FigureIndex(n) => write!(f, "{} {}", FIGURE_WORD, n),
            Label::ExerciseIndex(n) => write!(f, "{} {}", EXERCISE_WORD, n),
            Label::Title(t) => f.write_str(t),
            Label::Unknown => f.write_str(UNKNOWN_DISPLAY),
        }
    }
}

// --- Classifier ---

/// Decides whether a block is a structural title.
///
/// Text patterns only apply to blocks of at most 100 characters; a style name
/// containing "heading", "title" or "header" makes any block a title.
pub fn is_title(text: &str, style_name: Option<&str>) -> bool {
    let text = text.trim();

    let short_enough = text.chars().count() <= TITLE_MAX_CHARS;
    if short_enough && TITLE_TEXT_RE.iter().any(|re| re.is_match(text)) {
        return true;
    }

    match style_name {
        Some(style) => {
            let style = style.to_lowercase();
            STYLE_TITLE_KEYWORDS.iter().any(|kw| style.contains(kw))
        }
        None => false,
    }
}

/// Strips file-name-hostile characters, collapses whitespace and caps length.
pub fn clean_title(title: &str) -> String {
    let stripped = TITLE_STRIP_RE.replace_all(title, "");
    let cleaned = WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string();

    if cleaned.chars().count() > CLEAN_TITLE_MAX_CHARS {
        let mut short: String = cleaned.chars().take(CLEAN_TITLE_KEEP_CHARS).collect();
        short.push_str("...");
        short
    } else {
        cleaned
    }
}

// --- Index Extractor ---

fn last_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extracts a figure or exercise index from a non-title block.
///
/// Precedence: spelled "Hình n", then abbreviated "H.n", then any bare
/// numeral. Within a step the last occurrence in the text wins.
pub fn extract_index(text: &str) -> Option<Label> {
    if let Some(n) = last_capture(&FIGURE_RE, text) {
        return Some(Label::FigureIndex(n));
    }
    if let Some(n) = last_capture(&FIGURE_ABBREV_RE, text) {
        return Some(Label::FigureIndex(n));
    }
    last_capture(&NUMERAL_RE, text).map(Label::ExerciseIndex)
}

// --- Key Derivation ---

/// Derives the correlation key from a metadata entry or an extracted file name.
///
/// Spelled figure and exercise forms are tried first (same precedence and
/// last-match rule as `extract_index`); otherwise the first matching key
/// phrase, with aliases normalized, is the key.
pub fn derive_key(text: &str) -> Option<String> {
    if let Some(n) = last_capture(&FIGURE_RE, text) {
        return Some(Label::FigureIndex(n).to_string());
    }
    if let Some(n) = last_capture(&EXERCISE_RE, text) {
        return Some(Label::ExerciseIndex(n).to_string());
    }

    SPECIAL_KEY_RE.iter().find_map(|(re, canonical)| {
        re.find(text).map(|m| match canonical {
            Some(c) => (*c).to_string(),
            None => m.as_str().to_string(),
        })
    })
}

/// Distinct labels, titles first, then figures, then exercises.
pub fn summarize_labels<'a, I: IntoIterator<Item = &'a Label>>(labels: I) -> Vec<String> {
    let mut distinct: Vec<&Label> = Vec::new();
    for label in labels {
        if !distinct.contains(&label) {
            distinct.push(label);
        }
    }
    let mut summary: Vec<(u8, String)> = distinct
        .into_iter()
        .map(|l| (l.summary_rank(), l.to_string()))
        .collect();
    summary.sort();
    summary.into_iter().map(|(_, s)| s).collect()
}
