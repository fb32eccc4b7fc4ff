//! Decoding of raw model output into typed pass results.

use realview_core::schema::{CONSOLIDATION_SCHEMA_NAME, FEATURE_SCHEMA_NAME, GATING_SCHEMA_NAME};
use realview_core::{FeatureObservation, GatingResult, RoomConsolidation};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::InferenceError;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FeatureEnvelope {
    features: Vec<FeatureObservation>,
}

pub(crate) fn parse_gating(text: &str) -> Result<GatingResult, InferenceError> {
    let result: GatingResult = decode(GATING_SCHEMA_NAME, text)?;
    check_confidence(GATING_SCHEMA_NAME, result.confidence)?;
    Ok(result)
}

pub(crate) fn parse_features(text: &str) -> Result<Vec<FeatureObservation>, InferenceError> {
    let envelope: FeatureEnvelope = decode(FEATURE_SCHEMA_NAME, text)?;
    for feature in &envelope.features {
        check_confidence(FEATURE_SCHEMA_NAME, feature.confidence)?;
    }
    Ok(envelope.features)
}

pub(crate) fn parse_consolidation(text: &str) -> Result<RoomConsolidation, InferenceError> {
    let result: RoomConsolidation = decode(CONSOLIDATION_SCHEMA_NAME, text)?;
    for feature in &result.confirmed_features {
        check_confidence(CONSOLIDATION_SCHEMA_NAME, feature.confidence)?;
    }
    Ok(result)
}

fn decode<T: DeserializeOwned>(schema: &'static str, text: &str) -> Result<T, InferenceError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(InferenceError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|e| InferenceError::SchemaViolation {
        schema,
        detail: format!("{e}; raw: {}", body.chars().take(200).collect::<String>()),
    })
}

// Providers without strict schema enforcement do not check numeric bounds.
fn check_confidence(schema: &'static str, value: f32) -> Result<(), InferenceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InferenceError::SchemaViolation {
            schema,
            detail: format!("confidence {value} outside [0, 1]"),
        })
    }
}

/// Remove a surrounding ```` ```json ```` fence if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
