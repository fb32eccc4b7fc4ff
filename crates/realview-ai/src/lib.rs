//! Inference layer: the capability seam the pipeline calls through, the
//! provider backends behind it, and the rate limiter and retry policy every
//! call passes through.

mod backend;
mod capability;
mod config;
mod error;
mod gemini;
mod openai;
mod rate_limit;
mod response;
mod retry;

use std::sync::Arc;

pub use backend::{ModelRequest, StructuredBackend, Transport};
pub use capability::{InferenceCapability, RateLimitedCapability};
pub use config::{InferenceConfig, Provider};
pub use error::InferenceError;
pub use gemini::GeminiTransport;
pub use openai::OpenAiTransport;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;

/// Build the configured backend behind a fresh rate limiter.
pub fn create_capability(
    config: &InferenceConfig,
) -> Result<Arc<dyn InferenceCapability>, InferenceError> {
    config.validate()?;
    let limiter = Arc::new(RateLimiter::new(config.requests_per_minute)?);
    create_capability_with_limiter(config, limiter)
}

/// Build the configured backend behind an existing, possibly shared, limiter.
///
/// This is the only place that looks at [`Provider`].
pub fn create_capability_with_limiter(
    config: &InferenceConfig,
    limiter: Arc<RateLimiter>,
) -> Result<Arc<dyn InferenceCapability>, InferenceError> {
    config.validate()?;
    let retry = config.retry_policy();
    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        rpm = config.requests_per_minute,
        max_retries = config.max_retries,
        "initialising inference backend"
    );

    let capability: Arc<dyn InferenceCapability> = match config.provider {
        Provider::OpenAi => {
            let transport = OpenAiTransport::new(&config.api_key, &config.model)?;
            Arc::new(RateLimitedCapability::new(
                StructuredBackend::new(transport),
                limiter,
                retry,
            ))
        }
        Provider::Google => {
            let transport = GeminiTransport::new(&config.api_key, &config.model)?;
            Arc::new(RateLimitedCapability::new(
                StructuredBackend::new(transport),
                limiter,
                retry,
            ))
        }
    };
    Ok(capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_rejects_missing_api_key() {
        let config = InferenceConfig::new(Provider::OpenAi, "  ", "gpt-4.1-mini");
        let err = create_capability(&config).err().unwrap();
        assert!(matches!(err, InferenceError::InvalidConfiguration(_)));
    }

    #[test]
    fn factory_rejects_zero_rpm() {
        let mut config = InferenceConfig::new(Provider::Google, "key", "gemini-2.0-flash");
        config.requests_per_minute = 0;
        let err = create_capability(&config).err().unwrap();
        assert!(matches!(err, InferenceError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn factory_builds_each_provider() {
        for provider in [Provider::OpenAi, Provider::Google] {
            let config = InferenceConfig::new(provider, "key", provider.default_model());
            assert!(create_capability(&config).is_ok());
        }
    }
}
