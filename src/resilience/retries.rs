//! Retry policy for upstream requests.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::TransportError;
use crate::resilience::backoff::calculate_backoff;

/// Hard ceiling on attempts per upstream request, whatever the config says.
pub const MAX_UPSTREAM_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_UPSTREAM_ATTEMPTS),
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether a failure on `attempt` (1-based) deserves another try.
    pub fn should_retry(&self, attempt: u32, failure: &TransportError) -> bool {
        attempt < self.max_attempts && is_retryable(failure)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay, self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Connection failures and throttling/gateway statuses are worth a retry.
/// Other statuses, malformed bodies and credential failures are not.
pub fn is_retryable(failure: &TransportError) -> bool {
    match failure {
        TransportError::Network(_) => true,
        TransportError::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
        TransportError::Timeout(_)
        | TransportError::Decode(_)
        | TransportError::Credentials { .. } => false,
    }
}
