// ── Retry with bounded exponential backoff ──
//
// Wraps individual Dashboard API calls. Only transient failures (transport,
// 5xx, 429) are retried; anything the caller got wrong fails on the first
// attempt.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

/// How many times to try a call and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryPolicy {
    /// Total attempts including the first. `1` disables retries.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each one after.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay, including one the server asks for.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Delay before retrying after `err` on the given attempt. A server
    /// `Retry-After` replaces the computed backoff but is still capped at
    /// `max_backoff`.
    pub fn delay_for(&self, attempt: u32, err: &meraprov_api::Error) -> Duration {
        err.retry_after()
            .map_or_else(|| self.backoff_for(attempt), |d| d.min(self.max_backoff))
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, meraprov_api::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, meraprov_api::Error>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt, &err);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
