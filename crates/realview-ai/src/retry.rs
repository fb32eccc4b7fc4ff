//! Bounded exponential-backoff retry for a single inference call.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::InferenceError;

/// Retries a failing call up to `max_retries` extra times, sleeping
/// `backoff * 2^(attempt - 1)` after the n-th failure. Errors that are not
/// [retryable](InferenceError::is_retryable) are returned as they are.
///
/// Rate limiting is not done here; the operation acquires the limiter itself
/// so that every attempt, including the first, is throttled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Sleep after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.saturating_sub(1).min(62) as i32);
        Duration::try_from_secs_f64(self.backoff.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }

    /// Run `op` until it succeeds or the retry budget is spent.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, InferenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(InferenceError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        call = label,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "inference call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
