//! Retry policy for insurer calls

use std::time::Duration;

/// Bounded retries with exponential backoff and a per-call deadline
///
/// Only transport failures are retried. Attempt `n` (1-based) that fails
/// transiently waits `base_backoff * 2^(n-1)`, capped at `max_backoff`, before
/// attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed per insurer, including the first
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Deadline for a single call; expiry counts as a transport failure
    pub per_call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            per_call_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration, per_call_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            per_call_timeout,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Whether another attempt may follow the given one
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
