// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Invalid document archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Required part missing from document: {0}")]
    MissingPart(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Image not found for relationship id: {0}")]
    ImageNotFound(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("File already exists: {0}")]
    FileExists(String),

    #[error("Not a plain file name: {0}")]
    InvalidName(String),
}

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Could not read metadata file {path}: {source}")]
    MetadataRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse metadata file {path}: {source}")]
    MetadataParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document could not be opened: {0}")]
    Document(#[from] DocumentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Matching failed: {0}")]
    Matching(#[from] MatchError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
