//! Retry with backoff for transient MCP failures.

use chatlink_core::{RetryBackoff, ServerConfig};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::McpResult;

/// Bounded retry policy.
///
/// Attempts run strictly one after another; only errors for which
/// [`McpClientError::is_retryable`](crate::McpClientError::is_retryable)
/// holds trigger another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff: RetryBackoff,
}

impl RetryPolicy {
    /// `max_attempts` counts the first attempt; zero is treated as one.
    pub fn new(max_attempts: u32, delay: Duration, backoff: RetryBackoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.retry_attempts,
            config.retry_delay_duration(),
            config.retry_backoff,
        )
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            RetryBackoff::Fixed => self.delay,
            RetryBackoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor)
            }
        }
    }

    /// Run `operation` until it succeeds, fails terminally or attempts run out.
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, name: &str, mut operation: F) -> McpResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = McpResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        operation = name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay = ?delay,
                        error = %e,
                        "MCP request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
