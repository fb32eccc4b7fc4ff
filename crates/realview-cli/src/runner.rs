//! Property runs: one folder at a time, or many sharing one capability.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use futures::{StreamExt, stream};
use realview_ai::InferenceCapability;
use realview_core::PropertyResult;
use realview_pipeline::{ProcessorOptions, PropertyProcessor};
use tracing::{error, info};

use crate::images;
use crate::output::JsonLinesWriter;

pub async fn process_folder(
    processor: &PropertyProcessor,
    dir: &Path,
) -> anyhow::Result<PropertyResult> {
    let (property_id, assets) = images::load_property(dir)?;
    info!(property_id = %property_id, images = assets.len(), dir = %dir.display(), "loaded property");
    processor
        .process(&property_id, &assets)
        .await
        .with_context(|| format!("processing {property_id}"))
}

/// Process every folder in `dirs`, up to `parallel` at once, writing each
/// finished property as one JSON line.
///
/// All properties go through the same `capability`, and so through its rate
/// limiter. A failed property is logged and skipped; the batch returns an
/// error at the end if any failed. Returns the number of lines written.
pub async fn run_batch(
    capability: Arc<dyn InferenceCapability>,
    options: ProcessorOptions,
    dirs: &[PathBuf],
    parallel: usize,
    writer: &mut JsonLinesWriter,
) -> anyhow::Result<usize> {
    let processor = &PropertyProcessor::new(capability, options);
    let mut runs = stream::iter(dirs)
        .map(|dir| async move { (dir, process_folder(processor, dir).await) })
        .buffer_unordered(parallel.max(1));

    let mut failed = 0usize;
    let mut written = 0usize;
    while let Some((dir, outcome)) = runs.next().await {
        match outcome {
            Ok(result) => {
                writer.write(&result)?;
                written += 1;
            }
            Err(e) => {
                error!(dir = %dir.display(), "property failed: {e:#}");
                failed += 1;
            }
        }
    }

    info!(written, failed, "batch complete");
    if failed > 0 {
        bail!("{failed} of {} properties failed", dirs.len());
    }
    Ok(written)
}
