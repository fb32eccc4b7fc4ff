//! The three inference passes. Each is a thin call through the capability;
//! the only policy here is the optional gating allow-list override.

use realview_ai::{InferenceCapability, InferenceError};
use realview_core::{FeatureObservation, GatingResult, ImageAsset, RoomConsolidation, RoomType};
use tracing::debug;

use crate::AllowList;

/// Pass 1. With an allow-list, images of any other room type are forced to
/// `actionable = false` whatever the model said.
#[derive(Debug, Clone, Default)]
pub struct GatingStage {
    allow_list: Option<AllowList>,
}

impl GatingStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_list(allow_list: AllowList) -> Self {
        Self {
            allow_list: Some(allow_list),
        }
    }

    pub async fn run(
        &self,
        capability: &dyn InferenceCapability,
        image: &ImageAsset,
    ) -> Result<GatingResult, InferenceError> {
        let mut result = capability.classify(image).await?;
        if let Some(allow) = &self.allow_list
            && result.actionable
            && !allow.contains(result.room_type)
        {
            debug!(
                filename = %image.filename,
                room_type = %result.room_type,
                "room type not allowed, marking not actionable"
            );
            result.actionable = false;
        }
        Ok(result)
    }
}

/// Pass 2. Callers decide which images are eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDetectionStage;

impl FeatureDetectionStage {
    pub async fn run(
        &self,
        capability: &dyn InferenceCapability,
        image: &ImageAsset,
    ) -> Result<Vec<FeatureObservation>, InferenceError> {
        capability.detect_features(image).await
    }
}

/// Pass 2.5. Callers pick and chunk the images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolidationStage;

impl ConsolidationStage {
    pub async fn run(
        &self,
        capability: &dyn InferenceCapability,
        room_type: RoomType,
        images: &[&ImageAsset],
    ) -> Result<RoomConsolidation, InferenceError> {
        capability.consolidate(room_type, images).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, ScriptedCapability, asset};

    #[tokio::test]
    async fn gating_without_allow_list_passes_through() {
        let cap = ScriptedCapability::new().gate("a.jpg", RoomType::Garage, true, 0.6);
        let result = GatingStage::new().run(&cap, &asset("a.jpg")).await.unwrap();
        assert_eq!(result.room_type, RoomType::Garage);
        assert!(result.actionable);
    }

    #[tokio::test]
    async fn gating_forces_disallowed_room_not_actionable() {
        let cap = ScriptedCapability::new().gate("a.jpg", RoomType::Garage, true, 0.6);
        let stage = GatingStage::with_allow_list(AllowList::default());
        let result = stage.run(&cap, &asset("a.jpg")).await.unwrap();
        assert_eq!(result.room_type, RoomType::Garage);
        assert!(!result.actionable);
        assert!((result.confidence - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn gating_keeps_allowed_room_verdict() {
        let cap = ScriptedCapability::new()
            .gate("a.jpg", RoomType::Kitchen, true, 0.9)
            .gate("b.jpg", RoomType::Kitchen, false, 0.9);
        let stage = GatingStage::with_allow_list(AllowList::default());
        assert!(stage.run(&cap, &asset("a.jpg")).await.unwrap().actionable);
        assert!(!stage.run(&cap, &asset("b.jpg")).await.unwrap().actionable);
    }

    #[tokio::test]
    async fn detection_and_consolidation_delegate() {
        let cap = ScriptedCapability::new().mold("a.jpg");
        let (a, b) = (asset("a.jpg"), asset("b.jpg"));

        let features = FeatureDetectionStage.run(&cap, &a).await.unwrap();
        assert_eq!(features.len(), 1);

        let room = ConsolidationStage
            .run(&cap, RoomType::Bathroom, &[&a, &b])
            .await
            .unwrap();
        assert_eq!(room.room_type, RoomType::Bathroom);

        assert_eq!(
            cap.calls(),
            vec![
                Call::Detect("a.jpg".into()),
                Call::Consolidate(RoomType::Bathroom, vec!["a.jpg".into(), "b.jpg".into()]),
            ]
        );
    }
}
