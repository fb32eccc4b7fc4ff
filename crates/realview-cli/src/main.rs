mod config;
mod images;
mod output;
mod runner;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use realview_ai::{RateLimiter, create_capability, create_capability_with_limiter};
use realview_pipeline::PropertyProcessor;
use tracing::info;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "realview", version, about = "Property image inspection pipeline")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline on one property folder.
    Run {
        /// Path to an image folder, or a property id under the cases root.
        images_dir: String,

        #[arg(long, default_value = "out/results.json")]
        out: PathBuf,
    },
    /// Run several properties sharing one rate limit; writes JSON lines.
    Batch {
        /// Property ids or folder paths.
        #[arg(required = true)]
        properties: Vec<String>,

        #[arg(long, default_value = "out/results.jsonl")]
        out: PathBuf,

        /// Properties processed at once.
        #[arg(long, default_value_t = 1)]
        parallel: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.settings.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    info!("realview v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Run { images_dir, out } => cmd_run(&cli.settings, images_dir, out).await,
        Commands::Batch {
            properties,
            out,
            parallel,
        } => cmd_batch(&cli.settings, properties, out, *parallel).await,
    }
}

async fn cmd_run(settings: &Settings, images_dir: &str, out: &Path) -> anyhow::Result<()> {
    let config = settings.inference_config()?;
    let capability = create_capability(&config)?;
    info!(provider = %config.provider, model = %config.model, "initialized inference client");

    let dir = images::resolve_property_dir(images_dir, &settings.cases_root);
    let processor = PropertyProcessor::new(capability, settings.processor_options());

    let start = Instant::now();
    let result = runner::process_folder(&processor, &dir).await?;
    output::write_json(out, &result)?;

    info!(
        property_id = %result.property_id,
        elapsed_secs = start.elapsed().as_secs_f64(),
        out = %out.display(),
        "run complete"
    );
    Ok(())
}

async fn cmd_batch(
    settings: &Settings,
    properties: &[String],
    out: &Path,
    parallel: usize,
) -> anyhow::Result<()> {
    let config = settings.inference_config()?;
    let limiter = Arc::new(RateLimiter::new(config.requests_per_minute)?);
    let capability = create_capability_with_limiter(&config, limiter)?;
    info!(
        provider = %config.provider,
        properties = properties.len(),
        parallel,
        "starting batch"
    );

    let dirs: Vec<PathBuf> = properties
        .iter()
        .map(|arg| images::resolve_property_dir(arg, &settings.cases_root))
        .collect();
    let mut writer = output::JsonLinesWriter::create(out)?;
    let written = runner::run_batch(
        capability,
        settings.processor_options(),
        &dirs,
        parallel,
        &mut writer,
    )
    .await?;

    info!(written, out = %out.display(), "results written");
    Ok(())
}
