// src/extractors/mod.rs
pub mod images;
pub mod labels;
pub mod traversal;

// Re-export key extraction types for convenience
pub use images::{collect_images, CollectedImage, ImageCollection, ImageFailure};
pub use labels::Label;
pub use traversal::{BlockRole, TraversalState};
