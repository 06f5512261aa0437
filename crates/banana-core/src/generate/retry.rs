//! Retry utilities for transient generation failures.
//!
//! Provides classification of retryable errors and exponential backoff.

use crate::config::RetryConfig;
use crate::error::{ErrorKind, GenerationError};
use std::time::Duration;

/// Determine whether a generation error is worth retrying.
///
/// Retryable: rate limiting (429 or a quota-exhaustion signal) and service
/// overload (503). Everything else, including a reply without an image,
/// fails immediately.
pub fn is_retryable(error: &GenerationError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::RateLimited | ErrorKind::ServiceUnavailable
    )
}

/// Calculate the backoff before retry number `retry` (0-based).
///
/// Uses `base * 2^retry`. There is no cap: the retry budget bounds the
/// sequence.
pub fn backoff_duration(retry: u32, base: Duration) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry))
}

/// How many times to retry and how long to wait first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles afterwards
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(5000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// The full wait sequence this policy can produce.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|retry| backoff_duration(retry, self.initial_delay))
    }
}
