//! Retry policy for delivery attempts.
//!
//! Encapsulates the attempt budget and the backoff schedule so retry
//! behavior can be reasoned about and tested independently of the
//! processor.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Retry policy configuration for delivery attempts.
///
/// The schedule is deterministic by design: three fast retries have to fit
/// inside one scheduler slot, and the dead-letter cutoff must be
/// predictable, so no jitter is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of delivery attempts before dead-lettering.
    ///
    /// Default: 3 attempts
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (in milliseconds).
    ///
    /// The actual delay is `min(base * 2^(attempt - 1), max)`.
    ///
    /// Default: 1000 ms (1 second)
    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum retry delay (in milliseconds).
    ///
    /// Caps the exponential backoff.
    ///
    /// Default: 300000 ms (5 minutes)
    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_delay_ms: defaults::base_delay_ms(),
            max_delay_ms: defaults::max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether another attempt should be made after `attempts` failures.
    #[must_use]
    pub const fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Backoff delay before retry number `attempt` (1-indexed).
    ///
    /// `min(base * 2^(attempt - 1), max)`; saturates instead of
    /// overflowing for absurd attempt numbers.
    #[must_use]
    pub const fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let delay_ms = if exponent >= 63 {
            self.max_delay_ms
        } else {
            let multiplier = 1u64 << exponent;
            let delay = self.base_delay_ms.saturating_mul(multiplier);
            if delay < self.max_delay_ms {
                delay
            } else {
                self.max_delay_ms
            }
        };
        Duration::from_millis(delay_ms)
    }

    /// When the next attempt should run, given `attempt` failures so far.
    #[must_use]
    pub fn next_attempt_at(&self, attempt: u32, now: SystemTime) -> SystemTime {
        now + self.backoff(attempt)
    }
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        3
    }

    pub const fn base_delay_ms() -> u64 {
        1000 // 1 second
    }

    pub const fn max_delay_ms() -> u64 {
        300_000 // 5 minutes
    }
}
