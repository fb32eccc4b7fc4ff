pub mod prompts;
pub mod schema;
pub mod types;

pub use types::{
    ConsolidatedFeature, FeatureId, FeatureObservation, GatingResult, ImageAsset, ImageRecord,
    PropertyResult, RoomConsolidation, RoomType, Severity, UnknownVariant,
};
