//! Whole-batch retry policy
//!
//! Retries a batch submission that failed with a transient transport
//! error. The default waits 4s, 4s, 8s, then 10s between five attempts.

use crate::error::{Error, Result};
use crate::types::BackoffType;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy for whole-batch submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Backoff multiplier base
    pub initial_backoff: Duration,
    /// Lower bound for any wait
    pub min_backoff: Duration,
    /// Upper bound for any wait
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            min_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
            backoff_type: BackoffType::Exponential,
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no retries (debug mode)
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Default policy, or a single attempt in debug mode
    pub fn for_mode(debug: bool) -> Self {
        if debug {
            Self::disabled()
        } else {
            Self::default()
        }
    }

    /// Set the number of attempts
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the backoff bounds
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, min: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.min_backoff = min;
        self.max_backoff = max;
        self
    }

    /// Whether more than one attempt is made
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Wait before the retry that follows `attempt` (1-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        backoff_delay(
            self.backoff_type,
            self.initial_backoff,
            self.min_backoff,
            self.max_backoff,
            attempt,
        )
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "{label}: batch failed ({e}), attempt {attempt}/{}, retrying in {delay:?}",
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() && self.is_enabled() => {
                    return Err(Error::RetriesExhausted {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Backoff delay clamped to `[min, max]`
pub(crate) fn backoff_delay(
    backoff_type: BackoffType,
    initial: Duration,
    min: Duration,
    max: Duration,
    attempt: u32,
) -> Duration {
    let delay = match backoff_type {
        BackoffType::Constant => initial,
        BackoffType::Linear => initial.saturating_mul(attempt + 1),
        BackoffType::Exponential => initial.saturating_mul(2u32.saturating_pow(attempt)),
    };

    delay.clamp(min, max.max(min))
}
