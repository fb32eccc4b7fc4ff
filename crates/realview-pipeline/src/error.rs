use realview_ai::InferenceError;
use realview_core::RoomType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("duplicate image filename: {0}")]
    DuplicateImage(String),

    #[error("image {filename} belongs to property {found}, expected {expected}")]
    PropertyMismatch {
        filename: String,
        expected: String,
        found: String,
    },

    #[error("gating failed for {filename}: {source}")]
    Gating {
        filename: String,
        #[source]
        source: InferenceError,
    },

    #[error("feature detection failed for {filename}: {source}")]
    Detection {
        filename: String,
        #[source]
        source: InferenceError,
    },

    #[error("consolidation failed for {room_type} chunk {chunk} ({images:?}): {source}")]
    Consolidation {
        room_type: RoomType,
        chunk: usize,
        images: Vec<String>,
        #[source]
        source: InferenceError,
    },
}
