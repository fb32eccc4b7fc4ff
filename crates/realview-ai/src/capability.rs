//! The capability seam between the pipeline and whichever model provider is
//! configured.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use realview_core::{FeatureObservation, GatingResult, ImageAsset, RoomConsolidation, RoomType};

use crate::{InferenceError, RateLimiter, RetryPolicy};

/// The three structured inference operations the pipeline needs.
///
/// Implementations must return schema-validated values: an empty body is
/// [`InferenceError::EmptyResponse`], an unparseable one
/// [`InferenceError::SchemaViolation`].
#[async_trait]
pub trait InferenceCapability: Send + Sync {
    /// Pass 1: room type, actionability, confidence.
    async fn classify(&self, image: &ImageAsset) -> Result<GatingResult, InferenceError>;

    /// Pass 2: whitelisted feature observations for one image.
    async fn detect_features(
        &self,
        image: &ImageAsset,
    ) -> Result<Vec<FeatureObservation>, InferenceError>;

    /// Pass 2.5: confirmed features across several images of one room.
    async fn consolidate(
        &self,
        room_type: RoomType,
        images: &[&ImageAsset],
    ) -> Result<RoomConsolidation, InferenceError>;
}

/// Wraps a capability so every attempt of every call first acquires the
/// shared [`RateLimiter`], and failed calls are retried per [`RetryPolicy`].
pub struct RateLimitedCapability<C> {
    inner: C,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl<C: InferenceCapability> RateLimitedCapability<C> {
    pub fn new(inner: C, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            inner,
            limiter,
            retry,
        }
    }

    async fn guarded<T, F, Fut>(&self, label: &str, call: F) -> Result<T, InferenceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
    {
        let limiter = &self.limiter;
        let call = &call;
        self.retry
            .run(label, move || async move {
                limiter.acquire().await;
                call().await
            })
            .await
    }
}

#[async_trait]
impl<C: InferenceCapability> InferenceCapability for RateLimitedCapability<C> {
    async fn classify(&self, image: &ImageAsset) -> Result<GatingResult, InferenceError> {
        self.guarded("classify", || self.inner.classify(image)).await
    }

    async fn detect_features(
        &self,
        image: &ImageAsset,
    ) -> Result<Vec<FeatureObservation>, InferenceError> {
        self.guarded("detect_features", || self.inner.detect_features(image))
            .await
    }

    async fn consolidate(
        &self,
        room_type: RoomType,
        images: &[&ImageAsset],
    ) -> Result<RoomConsolidation, InferenceError> {
        self.guarded("consolidate", || self.inner.consolidate(room_type, images))
            .await
    }
}
