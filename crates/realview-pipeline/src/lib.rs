//! Property pipeline: per-image gating and feature detection, then
//! cross-image consolidation per room.

mod error;
pub mod grouping;
mod policy;
mod processor;
mod stages;

#[cfg(test)]
mod testing;

pub use error::PipelineError;
pub use grouping::{CHUNK_SIZE, ConsolidationJob, MIN_BUCKET_SIZE, plan_consolidation};
pub use policy::AllowList;
pub use processor::{ProcessorOptions, PropertyProcessor};
pub use stages::{ConsolidationStage, FeatureDetectionStage, GatingStage};
