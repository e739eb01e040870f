//! Bounded retry with exponential backoff, shared by both API clients.
//!
//! Each client classifies a single attempt into an [`Outcome`]; the policy
//! runs attempts until one succeeds, one fails terminally, or the attempt
//! budget is exhausted. No call retries indefinitely.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::contract::ApiError;

/// Classification of a single attempt against a remote API.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// Transient failure: back off and try again if the budget allows.
    Retryable(ApiError),
    /// Permanent failure: no further attempts make sense.
    Terminal(ApiError),
}

/// Retry budget and base delay. `max_retries` bounds the *total* number of
/// attempts; the delay before retry `n` is `retry_delay * 2^n`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Backoff to sleep after the given zero-based attempt index.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * 2u32.saturating_pow(attempt)
    }

    /// Run `attempt_fn` up to `max_retries` times, sleeping between retryable
    /// failures. Returns the success value, the terminal error, or the last
    /// retryable error once the budget is exhausted.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let mut last = ApiError::Transport("no attempts were made".to_string());

        for attempt in 0..self.max_retries {
            match attempt_fn().await {
                Outcome::Success(value) => {
                    debug!(operation, attempt = attempt + 1, "attempt succeeded");
                    return Ok(value);
                }
                Outcome::Terminal(e) => {
                    warn!(operation, attempt = attempt + 1, error = %e, "terminal failure, not retrying");
                    return Err(e);
                }
                Outcome::Retryable(e) => {
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "attempt failed"
                    );
                    last = e;
                    if attempt + 1 < self.max_retries {
                        let delay = self.backoff(attempt);
                        debug!(operation, delay_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        warn!(operation, max_retries = self.max_retries, error = %last, "retry budget exhausted");
        Err(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(0))
    }

    #[tokio::test]
    async fn terminal_failure_stops_after_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = policy()
            .run("op", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Outcome::Terminal(ApiError::Auth)
                }
            })
            .await;

        assert_eq!(result, Err(ApiError::Auth));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retryable_failures_exhaust_the_whole_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = policy()
            .run("op", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Outcome::Retryable(ApiError::RateLimited)
                }
            })
            .await;

        assert_eq!(result, Err(ApiError::RateLimited));
        assert_eq!(calls.load(Ordering::SeqCst), 3, "max_retries bounds total attempts");
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = policy()
            .run("op", move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Outcome::Retryable(ApiError::Transport("reset".into()))
                    } else {
                        Outcome::Success(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_grows_exponentially() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }
}
