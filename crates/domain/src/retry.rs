//! Retry policy value object.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// How the wait before the next attempt grows with the attempt number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackoffStrategy {
    Fixed,
    Linear,
    Exponential,
}

/// Bounded retry behaviour attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always `>= 1`.
    pub max_attempts: u32,
    pub backoff_strategy: BackoffStrategy,
    /// Base delay in milliseconds.
    pub backoff_delay_ms: u64,
    /// Failures after which no further attempt is made, even if
    /// `max_attempts` would allow one. `0` disables the threshold.
    pub failure_threshold: u32,
}

impl RetryPolicy {
    /// Build a validated policy.
    ///
    /// # Errors
    /// [`DomainError::InvalidRetryPolicy`] when `max_attempts` is zero.
    pub fn new(
        max_attempts: u32,
        backoff_strategy: BackoffStrategy,
        backoff_delay_ms: u64,
        failure_threshold: u32,
    ) -> Result<Self, DomainError> {
        let policy = Self {
            max_attempts,
            backoff_strategy,
            backoff_delay_ms,
            failure_threshold,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Re-check the bounds; used when a policy arrives through deserialization.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_attempts == 0 {
            return Err(DomainError::InvalidRetryPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Delay to wait after the given (1-indexed) failed attempt.
    ///
    /// Attempt `0` is treated as attempt `1`. Growth saturates instead of
    /// overflowing, so the result stays monotonic for every input.
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base = self.backoff_delay_ms;
        let millis = match self.backoff_strategy {
            BackoffStrategy::Fixed => base,
            BackoffStrategy::Linear => base.saturating_mul(u64::from(attempt)),
            BackoffStrategy::Exponential => {
                let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
                base.saturating_mul(factor)
            }
        };
        Duration::from_millis(millis)
    }

    /// Whether another attempt may follow `failures` failed attempts.
    pub fn permits_retry(&self, failures: u32) -> bool {
        if failures >= self.max_attempts {
            return false;
        }
        self.failure_threshold == 0 || failures < self.failure_threshold
    }
}
