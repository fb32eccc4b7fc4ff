//! Inference configuration, resolved once at startup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::InferenceError;
use crate::retry::RetryPolicy;

pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_SECONDS: f64 = 1.5;

/// External model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    OpenAi,
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4.1-mini",
            Self::Google => "gemini-2.0-flash",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "google" | "gemini" => Ok(Self::Google),
            other => Err(InferenceError::InvalidConfiguration(format!(
                "unknown provider '{other}' (expected 'openai' or 'google')"
            ))),
        }
    }
}

/// Settings for the inference backend and the call guards around it.
#[derive(Clone)]
pub struct InferenceConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub requests_per_minute: u32,
    pub max_retries: u32,
    pub retry_backoff_seconds: f64,
}

impl InferenceConfig {
    /// Config with default rate and retry settings.
    pub fn new(provider: Provider, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.into(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_seconds: DEFAULT_RETRY_BACKOFF_SECONDS,
        }
    }

    /// Reject missing credentials and out-of-range numeric settings.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.api_key.trim().is_empty() {
            return Err(InferenceError::InvalidConfiguration(format!(
                "an API key is required for provider '{}'",
                self.provider
            )));
        }
        if self.model.trim().is_empty() {
            return Err(InferenceError::InvalidConfiguration(
                "model identifier must not be empty".into(),
            ));
        }
        if self.requests_per_minute == 0 {
            return Err(InferenceError::InvalidConfiguration(
                "requests_per_minute must be positive".into(),
            ));
        }
        if !self.retry_backoff_seconds.is_finite() || self.retry_backoff_seconds <= 0.0 {
            return Err(InferenceError::InvalidConfiguration(format!(
                "retry_backoff_seconds must be positive, got {}",
                self.retry_backoff_seconds
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::try_from_secs_f64(self.retry_backoff_seconds).unwrap_or(Duration::ZERO),
        )
    }
}

// Keep the API key out of logs.
impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_seconds", &self.retry_backoff_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = InferenceConfig::new(Provider::OpenAi, "sk-test", "gpt-4.1-mini");
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff_seconds, 1.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn provider_parses_aliases() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Google);
        assert!("anthropic".parse::<Provider>().is_err());
    }

    #[test]
    fn validate_rejects_bad_backoff() {
        let mut config = InferenceConfig::new(Provider::OpenAi, "sk-test", "m");
        config.retry_backoff_seconds = 0.0;
        assert!(config.validate().is_err());
        config.retry_backoff_seconds = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_model() {
        let config = InferenceConfig::new(Provider::Google, "key", "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_is_allowed() {
        let mut config = InferenceConfig::new(Provider::OpenAi, "sk-test", "m");
        config.max_retries = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy().max_retries(), 0);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = InferenceConfig::new(Provider::OpenAi, "sk-secret", "m");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
