//! Per-property orchestration of the three passes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, TryStreamExt, stream};
use realview_ai::InferenceCapability;
use realview_core::{
    FeatureObservation, GatingResult, ImageAsset, ImageRecord, PropertyResult, RoomConsolidation,
};
use tracing::{debug, info, warn};

use crate::grouping::plan_consolidation;
use crate::{AllowList, ConsolidationStage, FeatureDetectionStage, GatingStage, PipelineError};

#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub allow_list: AllowList,
    /// Detection calls allowed in flight at once. Output order is unaffected.
    pub detection_concurrency: usize,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            allow_list: AllowList::default(),
            detection_concurrency: 1,
        }
    }
}

/// Runs gating, detection and consolidation over the images of one property.
///
/// A run either returns a complete [`PropertyResult`] or the first
/// unrecoverable stage error; partial results are never produced.
pub struct PropertyProcessor {
    capability: Arc<dyn InferenceCapability>,
    allow_list: AllowList,
    detection_concurrency: usize,
    gating: GatingStage,
    detection: FeatureDetectionStage,
    consolidation: ConsolidationStage,
}

impl PropertyProcessor {
    pub fn new(capability: Arc<dyn InferenceCapability>, options: ProcessorOptions) -> Self {
        Self {
            capability,
            gating: GatingStage::with_allow_list(options.allow_list.clone()),
            allow_list: options.allow_list,
            detection_concurrency: options.detection_concurrency.max(1),
            detection: FeatureDetectionStage,
            consolidation: ConsolidationStage,
        }
    }

    /// Process `images` (in enumeration order) for `property_id`.
    pub async fn process(
        &self,
        property_id: &str,
        images: &[ImageAsset],
    ) -> Result<PropertyResult, PipelineError> {
        check_images(property_id, images)?;
        if images.is_empty() {
            warn!(property_id, "no images found for property");
        }
        info!(property_id, images = images.len(), "processing property");

        let gating = self.gate(images).await?;
        let features = self.detect(images, &gating).await?;
        let rooms = self.consolidate(images, &gating).await?;

        let records: Vec<ImageRecord> = images
            .iter()
            .zip(gating)
            .zip(features)
            .filter(|((_, gate), _)| self.allow_list.contains(gate.room_type))
            .map(|((image, gate), features)| ImageRecord {
                filename: image.filename.clone(),
                gating: gate,
                features,
            })
            .collect();

        info!(
            property_id,
            images = records.len(),
            rooms = rooms.len(),
            "property complete"
        );
        Ok(PropertyResult {
            property_id: property_id.to_string(),
            created_at: Utc::now().to_rfc3339(),
            images: records,
            rooms,
        })
    }

    async fn gate(&self, images: &[ImageAsset]) -> Result<Vec<GatingResult>, PipelineError> {
        let mut results = Vec::with_capacity(images.len());
        for image in images {
            debug!(filename = %image.filename, "running gating");
            let result = self
                .gating
                .run(self.capability.as_ref(), image)
                .await
                .map_err(|source| PipelineError::Gating {
                    filename: image.filename.clone(),
                    source,
                })?;
            results.push(result);
        }
        Ok(results)
    }

    /// Feature lists aligned with `images`; ineligible images get none.
    async fn detect(
        &self,
        images: &[ImageAsset],
        gating: &[GatingResult],
    ) -> Result<Vec<Vec<FeatureObservation>>, PipelineError> {
        let eligible: Vec<usize> = gating
            .iter()
            .enumerate()
            .filter(|(_, gate)| gate.actionable && self.allow_list.contains(gate.room_type))
            .map(|(idx, _)| idx)
            .collect();

        let capability = self.capability.as_ref();
        let detection = &self.detection;
        let detected: Vec<(usize, Vec<FeatureObservation>)> = stream::iter(eligible)
            .map(|idx| async move {
                let image = &images[idx];
                debug!(filename = %image.filename, "running feature detection");
                detection
                    .run(capability, image)
                    .await
                    .map(|found| (idx, found))
                    .map_err(|source| PipelineError::Detection {
                        filename: image.filename.clone(),
                        source,
                    })
            })
            .buffered(self.detection_concurrency)
            .try_collect()
            .await?;

        let mut features = vec![Vec::new(); images.len()];
        for (idx, found) in detected {
            features[idx] = found;
        }
        Ok(features)
    }

    async fn consolidate(
        &self,
        images: &[ImageAsset],
        gating: &[GatingResult],
    ) -> Result<Vec<RoomConsolidation>, PipelineError> {
        let jobs = plan_consolidation(gating, &self.allow_list);
        let mut rooms = Vec::with_capacity(jobs.len());
        for job in jobs {
            let chunk: Vec<&ImageAsset> = job.images.iter().map(|&idx| &images[idx]).collect();
            info!(
                room_type = %job.room_type,
                chunk = job.chunk,
                images = chunk.len(),
                "running consolidation"
            );
            let room = self
                .consolidation
                .run(self.capability.as_ref(), job.room_type, &chunk)
                .await
                .map_err(|source| PipelineError::Consolidation {
                    room_type: job.room_type,
                    chunk: job.chunk,
                    images: chunk.iter().map(|img| img.filename.clone()).collect(),
                    source,
                })?;
            rooms.push(room);
        }
        Ok(rooms)
    }
}

/// Filenames key the per-image results, so they must be unique.
fn check_images(property_id: &str, images: &[ImageAsset]) -> Result<(), PipelineError> {
    let mut seen = HashSet::with_capacity(images.len());
    for image in images {
        if image.property_id != property_id {
            return Err(PipelineError::PropertyMismatch {
                filename: image.filename.clone(),
                expected: property_id.to_string(),
                found: image.property_id.clone(),
            });
        }
        if !seen.insert(image.filename.as_str()) {
            return Err(PipelineError::DuplicateImage(image.filename.clone()));
        }
    }
    Ok(())
}
