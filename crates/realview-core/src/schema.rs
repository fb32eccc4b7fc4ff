//! Strict JSON schemas for the three structured model responses.
//!
//! Each function returns the `{name, schema, strict}` envelope used by
//! structured-output APIs. Enum members are generated from the closed
//! vocabularies in [`crate::types`].

use serde_json::{Value, json};

use crate::types::{FeatureId, RoomType, Severity};

pub const GATING_SCHEMA_NAME: &str = "pass1_result";
pub const FEATURE_SCHEMA_NAME: &str = "pass2_result";
pub const CONSOLIDATION_SCHEMA_NAME: &str = "pass25_result";

fn room_types() -> Vec<&'static str> {
    RoomType::ALL.iter().map(RoomType::as_str).collect()
}

fn feature_ids() -> Vec<&'static str> {
    FeatureId::ALL.iter().map(FeatureId::as_str).collect()
}

fn severities() -> Vec<&'static str> {
    Severity::ALL.iter().map(Severity::as_str).collect()
}

fn confidence() -> Value {
    json!({"type": "number", "minimum": 0, "maximum": 1})
}

/// Object schema for one feature item; `text_field` is `explanation` or `evidence`.
fn feature_item(text_field: &str) -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "feature_id": {"type": "string", "enum": feature_ids()},
            "severity": {"type": "string", "enum": severities()},
            "confidence": confidence(),
            text_field: {"type": "string"},
        },
        "required": ["feature_id", "severity", "confidence", text_field],
    })
}

fn envelope(name: &str, schema: Value) -> Value {
    json!({"name": name, "schema": schema, "strict": true})
}

/// Pass 1: room type, actionability, confidence.
pub fn gating_schema() -> Value {
    envelope(
        GATING_SCHEMA_NAME,
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "room_type": {"type": "string", "enum": room_types()},
                "actionable": {"type": "boolean"},
                "confidence": confidence(),
            },
            "required": ["room_type", "actionable", "confidence"],
        }),
    )
}

/// Pass 2: `{"features": [...]}`.
pub fn feature_schema() -> Value {
    envelope(
        FEATURE_SCHEMA_NAME,
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "features": {"type": "array", "items": feature_item("explanation")},
            },
            "required": ["features"],
        }),
    )
}

/// Pass 2.5: `{"room_type": ..., "confirmed_features": [...]}`.
pub fn consolidation_schema() -> Value {
    envelope(
        CONSOLIDATION_SCHEMA_NAME,
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "room_type": {"type": "string", "enum": room_types()},
                "confirmed_features": {"type": "array", "items": feature_item("evidence")},
            },
            "required": ["room_type", "confirmed_features"],
        }),
    )
}
