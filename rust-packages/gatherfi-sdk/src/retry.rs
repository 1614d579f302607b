//! Exponential backoff for rate-limited reads.
//!
//! Only rate-limit failures are retried; everything else surfaces on the
//! first attempt. Never wrap a transaction submission in this.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY};
use crate::error::GatherFiError;

/// Errors that can tell whether the upstream asked us to slow down.
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

impl RateLimitSignal for GatherFiError {
    fn is_rate_limited(&self) -> bool {
        GatherFiError::is_rate_limited(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Delay after the first rate-limited attempt; doubles each time
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Backoff after the zero-based `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY)
    }
}

/// Run `op` until it succeeds, fails with a non-rate-limit error, or the
/// attempt budget runs out. The last error is returned in the latter case.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RateLimitSignal + Display,
{
    let attempts = policy.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "Rate limited (429). Retrying in {:?}... (attempt {}/{}): {}",
                    delay,
                    attempt + 1,
                    attempts,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
