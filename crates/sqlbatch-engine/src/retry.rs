//! Retry with exponential backoff
//!
//! A policy describes the schedule; `run`/`run_async` apply it to a fallible
//! operation. The policy does not classify errors, the caller decides what
//! to run under it.

use serde::{Deserialize, Serialize};
use sqlbatch_core::{BatchError, Result};
use std::future::Future;
use std::time::Duration;

/// Exponential backoff schedule for transient failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (3 retries means up to 4 attempts)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap on any single delay
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Delay before retry number `attempt` (zero-based). Clamped to
    /// `[0, max_delay]`; a non-finite or negative schedule never panics.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled =
            self.initial_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()).max(0.0))
    }

    /// Run `op` until it succeeds or the schedule is exhausted, sleeping on
    /// the current thread between attempts.
    pub fn run<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut last = None;
        for attempt in 0..=self.max_retries {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt < self.max_retries {
                        let delay = self.delay_for(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "attempt failed, retrying"
                        );
                        std::thread::sleep(delay);
                    }
                    last = Some(err);
                }
            }
        }
        Err(exhausted(self.max_retries, last))
    }

    /// Async counterpart of [`run`](Self::run), sleeping via the tokio timer.
    pub async fn run_async<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last = None;
        for attempt in 0..=self.max_retries {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt < self.max_retries {
                        let delay = self.delay_for(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last = Some(err);
                }
            }
        }
        Err(exhausted(self.max_retries, last))
    }
}

fn exhausted(max_retries: u32, last: Option<BatchError>) -> BatchError {
    BatchError::RetriesExhausted {
        attempts: max_retries + 1,
        message: last
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO)
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.backoff_factor, 2.0);
    }

    #[test]
    fn test_delay_schedule_doubles_and_caps() {
        let policy = RetryPolicy::default().with_max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(5));
        assert_eq!(policy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn test_negative_backoff_factor_never_panics() {
        let policy = RetryPolicy::default().with_backoff_factor(-2.0);

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::ZERO);
    }

    #[test]
    fn test_succeeds_after_failures() {
        let policy = instant_policy(3);
        let mut calls = 0;
        let result = policy.run(|| {
            calls += 1;
            if calls < 3 {
                Err(BatchError::Adapter("transient".to_string()))
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhaustion_reports_attempts_and_last_error() {
        let policy = instant_policy(2);
        let mut calls = 0;
        let result: Result<()> = policy.run(|| {
            calls += 1;
            Err(BatchError::Adapter(format!("failure {calls}")))
        });

        assert_eq!(calls, 3);
        match result.unwrap_err() {
            BatchError::RetriesExhausted { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("failure 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_retries_means_one_attempt() {
        let policy = instant_policy(0);
        let mut calls = 0;
        let result: Result<()> = policy.run(|| {
            calls += 1;
            Err(BatchError::Adapter("nope".to_string()))
        });

        assert_eq!(calls, 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_async_retry_succeeds() {
        let policy = instant_policy(2);
        let calls = std::cell::Cell::new(0u32);
        let result = policy
            .run_async(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 2 {
                        Err(BatchError::Adapter("transient".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
    }
}
