//! Minimum-interval rate limiting for outbound inference calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::InferenceError;

/// Enforces a minimum spacing between calls, shared by every caller.
///
/// The lock is held across the wait, so concurrent callers queue up behind
/// one another and each sees the timestamp left by its predecessor.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Result<Self, InferenceError> {
        if requests_per_minute == 0 {
            return Err(InferenceError::InvalidConfiguration(
                "requests_per_minute must be positive".into(),
            ));
        }
        Ok(Self {
            min_interval: Duration::from_secs_f64(60.0 / f64::from(requests_per_minute)),
            last_call: Mutex::new(None),
        })
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the minimum interval has passed since the previous
    /// acquisition, then record this one.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limiting");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}
