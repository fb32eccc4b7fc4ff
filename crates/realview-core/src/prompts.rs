//! System prompts for the three inference passes.

use crate::types::{FeatureId, RoomType};

pub const GATING_SYSTEM: &str = "\
You are an expert property inspector. \
Classify the room type shown in the image, whether the image is actionable, \
and provide a confidence score between 0 and 1. \
Only use the allowed room_type values.";

pub const FEATURE_SYSTEM: &str = "\
You are an expert property inspector. \
Identify issues and features strictly from the provided whitelist of feature IDs. \
Return only items that are visible. Use severity and confidence scores.";

pub const CONSOLIDATION_SYSTEM: &str = "\
You are consolidating room-level findings across multiple images of the same room. \
Be conservative: only confirm features when evidence is strong or repeated across images.";

/// Pass 2 prompt with the feature whitelist appended.
pub fn feature_prompt() -> String {
    let whitelist = FeatureId::ALL
        .iter()
        .map(FeatureId::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{FEATURE_SYSTEM}\nAllowed feature IDs: {whitelist}")
}

/// Text part that accompanies the images of a consolidation request.
pub fn consolidation_user_text(room_type: RoomType) -> String {
    format!("Room type to consolidate: {room_type}")
}
