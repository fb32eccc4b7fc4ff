//! Room buckets and consolidation chunks.

use realview_core::{GatingResult, RoomType};

use crate::AllowList;

/// Maximum images per consolidation request.
pub const CHUNK_SIZE: usize = 4;

/// Buckets smaller than this cannot show cross-image agreement and are skipped.
pub const MIN_BUCKET_SIZE: usize = 2;

/// One consolidation call: a room type and indices into the image list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationJob {
    pub room_type: RoomType,
    /// Position of this chunk within its room bucket.
    pub chunk: usize,
    pub images: Vec<usize>,
}

/// Bucket actionable images by room type, in first-seen order, keeping
/// image order inside each bucket.
pub fn group_actionable(gating: &[GatingResult]) -> Vec<(RoomType, Vec<usize>)> {
    let mut buckets: Vec<(RoomType, Vec<usize>)> = Vec::new();
    for (idx, result) in gating.iter().enumerate() {
        if !result.actionable {
            continue;
        }
        match buckets.iter_mut().find(|(room, _)| *room == result.room_type) {
            Some((_, members)) => members.push(idx),
            None => buckets.push((result.room_type, vec![idx])),
        }
    }
    buckets
}

/// Plan every consolidation call for a property.
///
/// Buckets outside the allow-list, or with fewer than [`MIN_BUCKET_SIZE`]
/// images, produce no jobs. The rest are split into chunks of at most
/// [`CHUNK_SIZE`].
pub fn plan_consolidation(gating: &[GatingResult], allow: &AllowList) -> Vec<ConsolidationJob> {
    let mut jobs = Vec::new();
    for (room_type, members) in group_actionable(gating) {
        if !allow.contains(room_type) {
            tracing::debug!(room_type = %room_type, "room type not allowed, skipping consolidation");
            continue;
        }
        if members.len() < MIN_BUCKET_SIZE {
            tracing::info!(
                room_type = %room_type,
                images = members.len(),
                "skipping consolidation due to insufficient images"
            );
            continue;
        }
        for (chunk, images) in members.chunks(CHUNK_SIZE).enumerate() {
            jobs.push(ConsolidationJob {
                room_type,
                chunk,
                images: images.to_vec(),
            });
        }
    }
    jobs
}
