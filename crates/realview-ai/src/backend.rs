//! Provider-independent request building on top of a raw [`Transport`].

use async_trait::async_trait;
use realview_core::{
    FeatureObservation, GatingResult, ImageAsset, RoomConsolidation, RoomType, prompts, schema,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::capability::InferenceCapability;
use crate::{InferenceError, response};

/// One structured-output request, independent of provider wire format.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub system_prompt: String,
    /// `{name, schema, strict}` envelope from [`realview_core::schema`].
    pub schema: Value,
    /// Optional text part placed before the images.
    pub text: Option<String>,
    /// Image data URLs, in order.
    pub images: Vec<&'a str>,
}

/// Sends a [`ModelRequest`] to a provider and returns the raw text output.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String, InferenceError>;
}

/// Implements the three passes for any [`Transport`].
pub struct StructuredBackend<T> {
    transport: T,
}

impl<T: Transport> StructuredBackend<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> InferenceCapability for StructuredBackend<T> {
    async fn classify(&self, image: &ImageAsset) -> Result<GatingResult, InferenceError> {
        let request = ModelRequest {
            system_prompt: prompts::GATING_SYSTEM.to_string(),
            schema: schema::gating_schema(),
            text: None,
            images: vec![image.data_url.as_str()],
        };
        let text = self.transport.generate(&request).await?;
        let result = response::parse_gating(&text)?;
        debug!(
            filename = %image.filename,
            room_type = %result.room_type,
            actionable = result.actionable,
            "classified image"
        );
        Ok(result)
    }

    async fn detect_features(
        &self,
        image: &ImageAsset,
    ) -> Result<Vec<FeatureObservation>, InferenceError> {
        let request = ModelRequest {
            system_prompt: prompts::feature_prompt(),
            schema: schema::feature_schema(),
            text: None,
            images: vec![image.data_url.as_str()],
        };
        let text = self.transport.generate(&request).await?;
        response::parse_features(&text)
    }

    async fn consolidate(
        &self,
        room_type: RoomType,
        images: &[&ImageAsset],
    ) -> Result<RoomConsolidation, InferenceError> {
        let request = ModelRequest {
            system_prompt: prompts::CONSOLIDATION_SYSTEM.to_string(),
            schema: schema::consolidation_schema(),
            text: Some(prompts::consolidation_user_text(room_type)),
            images: images.iter().map(|img| img.data_url.as_str()).collect(),
        };
        let text = self.transport.generate(&request).await?;
        let mut result = response::parse_consolidation(&text)?;
        if result.room_type != room_type {
            warn!(
                requested = %room_type,
                returned = %result.room_type,
                "consolidation answered for a different room, keeping requested room"
            );
            result.room_type = room_type;
        }
        Ok(result)
    }
}
