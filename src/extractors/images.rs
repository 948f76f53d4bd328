// src/extractors/images.rs
use crate::document::model::{blocks_in_order, BlockLocation, DocumentSource, ImagePart};
use crate::extractors::labels::Label;
use crate::extractors::traversal::{advance, BlockRole, TraversalState};

const CONTEXT_CHARS: usize = 50;

/// One image met during the labeling pass.
#[derive(Debug, Clone)]
pub struct CollectedImage {
    pub sequence: usize,      // 1-based, in traversal order
    pub image_id: String,     // Relationship id inside the document
    pub label: Label,
    pub context: String,      // First 50 chars of the owning block
    pub location: BlockLocation,
    pub part: ImagePart,
}

/// An image reference that was not collected: unresolvable, or sitting in an anchor block.
#[derive(Debug, Clone)]
pub struct ImageFailure {
    pub image_id: String,
    pub location: BlockLocation,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImageCollection {
    pub images: Vec<CollectedImage>,
    pub failures: Vec<ImageFailure>, // Could not be resolved to bytes
    pub skipped: Vec<ImageFailure>,  // Embedded in a title or index block
}

/// Walks the whole document once and labels every resolvable image.
///
/// State threads through top-level blocks and every table cell without
/// resets, so a cell holding only an image inherits whatever was active
/// before it. Images inside title or index blocks take no sequence number
/// and are listed in `skipped`.
pub fn collect_images<D: DocumentSource + ?Sized>(doc: &D) -> ImageCollection {
    let mut collection = ImageCollection::default();
    let mut state = TraversalState::default();

    for (location, block) in blocks_in_order(doc) {
        let (next, role) = advance(state, &block.text, block.style_name.as_deref());
        state = next;

        let anchor = match role {
            BlockRole::Title => Some("title"),
            BlockRole::IndexAnchor => Some("index"),
            BlockRole::Content => None,
        };
        if let Some(kind) = anchor {
            for image in &block.images {
                tracing::warn!("Skipping image {} in {} block at {}", image.id, kind, location);
                collection.skipped.push(ImageFailure {
                    image_id: image.id.clone(),
                    location,
                    reason: format!("embedded in {} block", kind),
                });
            }
            continue;
        }

        for image in &block.images {
            let label = state.current_label();
            match doc.resolve_image(&image.id) {
                Ok(part) => {
                    let sequence = collection.images.len() + 1;
                    tracing::info!("Image {:02} at {} -> '{}'", sequence, location, label);
                    collection.images.push(CollectedImage {
                        sequence,
                        image_id: image.id.clone(),
                        label,
                        context: block.text.chars().take(CONTEXT_CHARS).collect(),
                        location,
                        part,
                    });
                }
                Err(e) => {
                    tracing::warn!("Dropping image {} at {}: {}", image.id, location, e);
                    collection.failures.push(ImageFailure {
                        image_id: image.id.clone(),
                        location,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(
        "Collected {} image(s), {} unresolved, {} skipped in anchor blocks",
        collection.images.len(),
        collection.failures.len(),
        collection.skipped.len()
    );
    collection
}
