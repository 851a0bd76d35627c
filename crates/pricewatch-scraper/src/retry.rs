//! Retry policy for scrape attempts.
//!
//! A scrape moves through `Attempting(n)` until it either succeeds or hits a
//! terminal failure. [`RetryPolicy::decide`] is the pure transition function;
//! [`RetryPolicy::run`] drives it as a loop, sleeping between attempts.

use std::future::Future;
use std::time::Duration;

use crate::error::{FailureKind, ScrapeError};

/// Outcome of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt number `next_attempt`.
    Retry { next_attempt: u32, delay: Duration },
    /// Terminal failure: return the error.
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Builds a policy from a fractional-second base delay. Negative or
    /// non-finite values fall back to no delay.
    #[must_use]
    pub fn from_secs_f64(max_retries: u32, base_delay_secs: f64) -> Self {
        let base_delay = Duration::try_from_secs_f64(base_delay_secs).unwrap_or(Duration::ZERO);
        Self::new(max_retries, base_delay)
    }

    /// Backoff before retry `attempt + 1`: `base_delay * 2^attempt`.
    ///
    /// | attempt | delay (base 2 s) |
    /// |---------|------------------|
    /// | 0       | 2 s              |
    /// | 1       | 4 s              |
    /// | 2       | 8 s              |
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(31))
    }

    /// Transition from `Attempting(attempt)` after a failure of kind `kind`.
    ///
    /// Only transient failures are retried, and only while
    /// `attempt < max_retries`. Permanent and unclassified failures are
    /// terminal regardless of the attempt count.
    #[must_use]
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        match kind {
            FailureKind::Transient if attempt < self.max_retries => RetryDecision::Retry {
                next_attempt: attempt + 1,
                delay: self.delay_for(attempt),
            },
            FailureKind::Transient | FailureKind::Permanent | FailureKind::Unclassified => {
                RetryDecision::GiveUp
            }
        }
    }

    /// Runs `operation` until it succeeds or [`Self::decide`] gives up.
    ///
    /// At most `1 + max_retries` attempts are made. The last error is
    /// returned on terminal failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn run<T, F, Fut>(&self, url: &str, mut operation: F) -> Result<T, ScrapeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.decide(attempt, err.kind()) {
                RetryDecision::Retry {
                    next_attempt,
                    delay,
                } => {
                    tracing::warn!(
                        url,
                        attempt = next_attempt,
                        max_retries = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient scrape error, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::GiveUp => return Err(err),
            }
        }
    }
}
