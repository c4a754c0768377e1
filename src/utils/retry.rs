/// Bounded retry with exponential backoff
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay before the second attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Retry policy: fixed attempt ceiling, delay doubling after every failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay slept after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Run `operation` until `is_success` accepts its value or attempts run out
    ///
    /// - Returns the first accepted value
    /// - When every attempt is rejected, returns the last value anyway
    /// - An `Err` from `operation` stops retrying and is returned as-is
    ///
    /// No sleep happens after the final attempt.
    pub async fn retry_until<F, Fut, T, P>(
        &self,
        description: &str,
        operation: F,
        is_success: P,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&T) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("{} (attempt {}/{})", description, attempt, max_attempts);
            let value = operation().await?;

            if is_success(&value) || attempt >= max_attempts {
                return Ok(value);
            }

            let delay = self.delay_after(attempt);
            warn!(
                "{} failed, retrying in {:?} (attempt {}/{})",
                description, delay, attempt, max_attempts
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
