// src/extractors/traversal.rs
use crate::extractors::labels::{self, Label};

/// Active context while walking a document in labeling order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalState {
    pub active_index: Option<Label>, // FigureIndex or ExerciseIndex only
    pub active_title: Option<Label>, // Title only
}

/// What a block turned out to be once the state machine looked at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRole {
    /// Sets the active title and clears the active index.
    Title,
    /// Sets the active index; the title is left alone.
    IndexAnchor,
    /// Neither; the block's images take the current label.
    Content,
}

impl TraversalState {
    /// Label for an image met in the current state: index, then title, then unknown.
    pub fn current_label(&self) -> Label {
        self.active_index
            .as_ref()
            .or(self.active_title.as_ref())
            .cloned()
            .unwrap_or(Label::Unknown)
    }
}

/// Applies one block to the state.
///
/// Title and index anchors never carry images for labeling purposes; only
/// `Content` blocks are scanned by the collector.
pub fn advance(
    state: TraversalState,
    text: &str,
    style_name: Option<&str>,
) -> (TraversalState, BlockRole) {
    if labels::is_title(text, style_name) {
        let title = labels::clean_title(text);
        tracing::debug!("New title: '{}' (active index cleared)", title);
        // A heading that cleans down to nothing still ends the previous section
        let active_title = if title.is_empty() { None } else { Some(Label::Title(title)) };
        let next = TraversalState {
            active_index: None,
            active_title,
        };
        return (next, BlockRole::Title);
    }

    if let Some(index) = labels::extract_index(text) {
        tracing::debug!("New active index: '{}'", index);
        let next = TraversalState {
            active_index: Some(index),
            ..state
        };
        return (next, BlockRole::IndexAnchor);
    }

    tracing::trace!("Content block, state unchanged");
    (state, BlockRole::Content)
}
