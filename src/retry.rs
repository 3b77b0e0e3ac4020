//! Bounded retry with a constant delay between attempts.
//!
//! Every control plane query goes through [`retry_with_fixed_delay`]. Once the
//! attempts are used up the last error is handed back and the caller decides
//! what an absent answer means.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one. Never below 1.
    pub max_attempts: u32,
    /// Sleep between two attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retries.
    #[cfg(test)]
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Run `operation` until it succeeds or `config.max_attempts` is reached.
pub async fn retry_with_fixed_delay<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= max_attempts => {
                error!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    "Operation failed after max retries"
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = config.delay.as_millis(),
                    "Operation failed, retrying"
                );
                tokio::time::sleep(config.delay).await;
            }
        }
    }
}
