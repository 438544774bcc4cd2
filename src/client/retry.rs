//! Bounded retry with exponential backoff
//!
//! Every remote call goes through [`RetryExecutor`]. Only 429/500/503
//! responses (and connection-level faults) are retried; anything else fails
//! on the spot with its status and body intact. Rate-limit responses wait on
//! a larger base delay than other transient failures.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for the first retry
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,

    /// Base delay multiplier applied when the server answered 429
    #[serde(default = "default_rate_limit_multiplier")]
    pub rate_limit_multiplier: u32,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_rate_limit_multiplier() -> u32 {
    2
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            rate_limit_multiplier: default_rate_limit_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^attempt`, attempt zero-indexed. Saturates instead of overflowing.
    pub fn delay(attempt: u32, base: Duration) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        base.saturating_mul(factor)
    }

    /// Base delay for the failure that triggered the retry.
    pub fn base_for(&self, err: &Error) -> Duration {
        if err.is_rate_limited() {
            self.base_delay.saturating_mul(self.rate_limit_multiplier)
        } else {
            self.base_delay
        }
    }

    /// Wait before the attempt following `attempt` (zero-indexed).
    pub fn delay_for(&self, attempt: u32, err: &Error) -> Duration {
        Self::delay(attempt, self.base_for(err))
    }
}

/// Where a single logical call stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// About to issue attempt `n` (zero-indexed)
    Attempting(u32),
    Success,
    FatalFailure,
}

impl AttemptState {
    pub fn start() -> Self {
        AttemptState::Attempting(0)
    }

    /// Transition after the current attempt failed with `err`.
    pub fn on_failure(self, err: &Error, policy: &RetryPolicy) -> Self {
        match self {
            AttemptState::Attempting(n) if err.is_retryable() && n + 1 < policy.max_attempts => {
                AttemptState::Attempting(n + 1)
            }
            AttemptState::Attempting(_) => AttemptState::FatalFailure,
            terminal => terminal,
        }
    }

    pub fn on_success(self) -> Self {
        match self {
            AttemptState::Attempting(_) => AttemptState::Success,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::Attempting(_))
    }
}

/// Details of an upcoming retry, handed to the caller's observer
#[derive(Debug, Clone, PartialEq)]
pub struct RetryNotice {
    /// One-based number of the attempt that failed
    pub failed_attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub rate_limited: bool,
    pub cause: String,
}

/// Retry metrics for observability
#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    pub total_attempts: u32,
    pub successful_calls: u32,
    pub failed_calls: u32,
    pub retries: Vec<(u32, Duration)>,
}

impl RetryMetrics {
    fn record_success(&mut self, attempts: u32) {
        self.total_attempts += attempts;
        self.successful_calls += 1;
    }

    fn record_failure(&mut self, attempts: u32) {
        self.total_attempts += attempts;
        self.failed_calls += 1;
    }

    fn record_retry(&mut self, attempt: u32, delay: Duration) {
        self.retries.push((attempt, delay));
    }

    /// Sum of every backoff wait so far
    pub fn total_wait(&self) -> Duration {
        self.retries.iter().map(|(_, d)| *d).sum()
    }
}

/// Runs remote calls under a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    metrics: Arc<RwLock<RetryMetrics>>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            metrics: Arc::new(RwLock::new(RetryMetrics::default())),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `operation` until it succeeds, fails fatally or runs out of attempts.
    ///
    /// `on_retry` fires before each backoff sleep. Exhausting the attempts on
    /// a retryable failure yields [`Error::RetriesExhausted`] wrapping the last
    /// cause; a non-retryable failure is returned unchanged.
    pub async fn execute_with_retry<F, Fut, T, N>(
        &self,
        context: &str,
        mut operation: F,
        mut on_retry: N,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        N: FnMut(&RetryNotice),
    {
        let mut state = AttemptState::start();

        loop {
            let AttemptState::Attempting(attempt) = state else {
                return Err(Error::Validation(format!(
                    "{context}: retry loop entered terminal state"
                )));
            };

            debug!("{} (attempt {}/{})", context, attempt + 1, self.policy.max_attempts);

            match operation().await {
                Ok(value) => {
                    state = state.on_success();
                    debug_assert_eq!(state, AttemptState::Success);
                    self.metrics.write().await.record_success(attempt + 1);
                    return Ok(value);
                }
                Err(err) => {
                    state = state.on_failure(&err, &self.policy);
                    if state == AttemptState::FatalFailure {
                        self.metrics.write().await.record_failure(attempt + 1);
                        return Err(self.fatal_error(context, attempt + 1, err));
                    }

                    let delay = self.policy.delay_for(attempt, &err);
                    let notice = RetryNotice {
                        failed_attempt: attempt + 1,
                        max_attempts: self.policy.max_attempts,
                        delay,
                        rate_limited: err.is_rate_limited(),
                        cause: err.to_string(),
                    };

                    info!(
                        "Retrying {} (attempt {}/{}) after {:?}: {}",
                        context,
                        attempt + 1,
                        self.policy.max_attempts,
                        delay,
                        err
                    );
                    on_retry(&notice);

                    tokio::time::sleep(delay).await;
                    self.metrics.write().await.record_retry(attempt + 1, delay);
                }
            }
        }
    }

    fn fatal_error(&self, context: &str, attempts: u32, err: Error) -> Error {
        if err.is_retryable() {
            warn!("{} exhausted {} attempts", context, attempts);
            Error::RetriesExhausted {
                context: context.to_string(),
                attempts,
                last: Box::new(err),
            }
        } else {
            warn!("{} failed with non-retryable error: {}", context, err);
            err
        }
    }

    pub async fn metrics(&self) -> RetryMetrics {
        self.metrics.read().await.clone()
    }
}
