//! Command-line and environment settings shared by every subcommand.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use realview_ai::{InferenceConfig, Provider};
use realview_core::RoomType;
use realview_pipeline::{AllowList, ProcessorOptions};

#[derive(Args, Debug)]
pub struct Settings {
    /// Model provider: openai or google.
    #[arg(long, global = true, env = "LLM_PROVIDER", default_value = "openai")]
    pub provider: Provider,

    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = "gpt-4.1-mini")]
    pub openai_model: String,

    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    #[arg(long, global = true, env = "GOOGLE_MODEL", default_value = "gemini-2.0-flash")]
    pub google_model: String,

    #[arg(long, global = true, env = "REQUESTS_PER_MINUTE", default_value_t = 60)]
    pub requests_per_minute: u32,

    #[arg(long, global = true, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    #[arg(long, global = true, env = "RETRY_BACKOFF_SECONDS", default_value_t = 1.5)]
    pub retry_backoff_seconds: f64,

    /// Room types eligible for detection and consolidation (comma separated).
    /// Defaults to kitchen and bathroom.
    #[arg(long = "allow-rooms", global = true, value_delimiter = ',')]
    pub allow_rooms: Vec<RoomType>,

    /// Feature detection calls in flight per property.
    #[arg(long, global = true, default_value_t = 1)]
    pub detection_concurrency: usize,

    /// Folder holding `case_<id>` property folders.
    #[arg(long, global = true, env = "REALVIEW_CASES_ROOT", default_value = "cases")]
    pub cases_root: PathBuf,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
}

impl Settings {
    pub fn inference_config(&self) -> anyhow::Result<InferenceConfig> {
        let (key, model) = match self.provider {
            Provider::OpenAi => (&self.openai_api_key, &self.openai_model),
            Provider::Google => (&self.google_api_key, &self.google_model),
        };
        let mut config = InferenceConfig::new(
            self.provider,
            key.clone().unwrap_or_default(),
            model.clone(),
        );
        config.requests_per_minute = self.requests_per_minute;
        config.max_retries = self.max_retries;
        config.retry_backoff_seconds = self.retry_backoff_seconds;
        config
            .validate()
            .with_context(|| format!("invalid configuration for provider {}", self.provider))?;
        Ok(config)
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        let allow_list = if self.allow_rooms.is_empty() {
            AllowList::default()
        } else {
            self.allow_rooms.iter().copied().collect()
        };
        ProcessorOptions {
            allow_list,
            detection_concurrency: self.detection_concurrency.max(1),
        }
    }
}
