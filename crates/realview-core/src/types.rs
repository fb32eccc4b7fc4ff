//! Shared domain types for the property inspection pipeline.
//!
//! Everything a model may return is expressed as a closed enum so that a
//! response naming an unknown room or feature fails deserialization instead
//! of leaking into results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name a member of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// ── Closed vocabularies ──

/// Room type assigned by the gating pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Kitchen,
    Bathroom,
    LivingRoom,
    Bedroom,
    DiningRoom,
    Hallway,
    Garage,
    Exterior,
    Facade,
    Unknown,
}

impl RoomType {
    pub const ALL: &'static [RoomType] = &[
        Self::Kitchen,
        Self::Bathroom,
        Self::LivingRoom,
        Self::Bedroom,
        Self::DiningRoom,
        Self::Hallway,
        Self::Garage,
        Self::Exterior,
        Self::Facade,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kitchen => "kitchen",
            Self::Bathroom => "bathroom",
            Self::LivingRoom => "living_room",
            Self::Bedroom => "bedroom",
            Self::DiningRoom => "dining_room",
            Self::Hallway => "hallway",
            Self::Garage => "garage",
            Self::Exterior => "exterior",
            Self::Facade => "facade",
            Self::Unknown => "unknown",
        }
    }
}

/// Whitelisted feature identifiers the detection pass may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureId {
    WaterDamage,
    Mold,
    BrokenFixture,
    StainedCarpet,
    CrackedTile,
}

impl FeatureId {
    pub const ALL: &'static [FeatureId] = &[
        Self::WaterDamage,
        Self::Mold,
        Self::BrokenFixture,
        Self::StainedCarpet,
        Self::CrackedTile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaterDamage => "water_damage",
            Self::Mold => "mold",
            Self::BrokenFixture => "broken_fixture",
            Self::StainedCarpet => "stained_carpet",
            Self::CrackedTile => "cracked_tile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: &'static [Severity] = &[Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

fn parse_variant<T: Copy>(
    kind: &'static str,
    all: &[T],
    name: impl Fn(&T) -> &'static str,
    s: &str,
) -> Result<T, UnknownVariant> {
    let needle = s.trim();
    all.iter()
        .find(|v| name(*v).eq_ignore_ascii_case(needle))
        .copied()
        .ok_or_else(|| UnknownVariant {
            kind,
            value: needle.to_string(),
        })
}

impl FromStr for RoomType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("room type", Self::ALL, Self::as_str, s)
    }
}

impl FromStr for FeatureId {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("feature id", Self::ALL, Self::as_str, s)
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("severity", Self::ALL, Self::as_str, s)
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Inputs ──

/// One image of a property, already encoded as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub filename: String,
    pub property_id: String,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
}

impl ImageAsset {
    pub fn new(
        filename: impl Into<String>,
        property_id: impl Into<String>,
        data_url: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            property_id: property_id.into(),
            data_url: data_url.into(),
        }
    }
}

// ── Pass outputs ──

/// Pass 1 verdict for a single image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatingResult {
    pub room_type: RoomType,
    pub actionable: bool,
    pub confidence: f32,
}

/// A single whitelisted observation from pass 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureObservation {
    pub feature_id: FeatureId,
    pub severity: Severity,
    pub confidence: f32,
    pub explanation: String,
}

/// A feature confirmed across several images of the same room (pass 2.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolidatedFeature {
    pub feature_id: FeatureId,
    pub severity: Severity,
    pub confidence: f32,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomConsolidation {
    pub room_type: RoomType,
    pub confirmed_features: Vec<ConsolidatedFeature>,
}

// ── Result record ──

/// Per-image entry of a [`PropertyResult`].
///
/// Field names on the wire match the review tool (`pass1`, `pass2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub filename: String,
    #[serde(rename = "pass1")]
    pub gating: GatingResult,
    #[serde(rename = "pass2")]
    pub features: Vec<FeatureObservation>,
}

/// The complete outcome of one property run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyResult {
    pub property_id: String,
    /// ISO 8601 timestamp string.
    pub created_at: String,
    pub images: Vec<ImageRecord>,
    pub rooms: Vec<RoomConsolidation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_type_serializes_snake_case() {
        let json = serde_json::to_string(&RoomType::DiningRoom).unwrap();
        assert_eq!(json, "\"dining_room\"");
        let parsed: RoomType = serde_json::from_str("\"living_room\"").unwrap();
        assert_eq!(parsed, RoomType::LivingRoom);
    }

    #[test]
    fn as_str_matches_serde_names() {
        for room in RoomType::ALL {
            let json = serde_json::to_string(room).unwrap();
            assert_eq!(json, format!("\"{}\"", room.as_str()));
        }
        for feature in FeatureId::ALL {
            let json = serde_json::to_string(feature).unwrap();
            assert_eq!(json, format!("\"{}\"", feature.as_str()));
        }
    }

    #[test]
    fn unknown_room_type_is_rejected() {
        let parsed: Result<RoomType, _> = serde_json::from_str("\"ballroom\"");
        assert!(parsed.is_err());

        let err = "ballroom".parse::<RoomType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown room type 'ballroom'");
    }

    #[test]
    fn room_vocabulary_is_closed() {
        assert_eq!(RoomType::ALL.len(), 10);
        assert!("roof".parse::<RoomType>().is_err());
        assert!("technical_room".parse::<RoomType>().is_err());
        assert_eq!("facade".parse::<RoomType>().unwrap(), RoomType::Facade);
    }

    #[test]
    fn from_str_is_case_insensitive_and_trims() {
        assert_eq!(" Kitchen ".parse::<RoomType>().unwrap(), RoomType::Kitchen);
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("mold".parse::<FeatureId>().unwrap(), FeatureId::Mold);
    }

    #[test]
    fn image_record_uses_pass_field_names() {
        let record = ImageRecord {
            filename: "img1.jpg".into(),
            gating: GatingResult {
                room_type: RoomType::Kitchen,
                actionable: true,
                confidence: 0.5,
            },
            features: vec![FeatureObservation {
                feature_id: FeatureId::Mold,
                severity: Severity::Low,
                confidence: 0.25,
                explanation: "spots above the sink".into(),
            }],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["pass1"]["room_type"], "kitchen");
        assert_eq!(value["pass1"]["actionable"], true);
        assert_eq!(value["pass2"][0]["feature_id"], "mold");
        assert_eq!(value["pass2"][0]["severity"], "low");
    }

    #[test]
    fn property_result_parses_review_tool_shape() {
        let json = r#"{
            "property_id": "case_2203177",
            "created_at": "2026-02-21T10:00:00+00:00",
            "images": [
                {
                    "filename": "a.jpg",
                    "pass1": {"room_type": "bathroom", "actionable": true, "confidence": 0.75},
                    "pass2": []
                }
            ],
            "rooms": [
                {
                    "room_type": "bathroom",
                    "confirmed_features": [
                        {"feature_id": "cracked_tile", "severity": "medium", "confidence": 0.5, "evidence": "two images"}
                    ]
                }
            ]
        }"#;
        let parsed: PropertyResult = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.images.len(), 1);
        assert_eq!(parsed.images[0].gating.room_type, RoomType::Bathroom);
        assert_eq!(
            parsed.rooms[0].confirmed_features[0].feature_id,
            FeatureId::CrackedTile
        );
    }
}
