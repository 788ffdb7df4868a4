//! Retry-with-backoff policy for upstream calls.

use crate::config::{POSTER_MAX_ATTEMPTS, POSTER_RETRY_MAX_MS, POSTER_RETRY_MIN_MS};
use crate::error::RelayError;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

/// Bounded exponential backoff, retrying only retryable errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: usize,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: POSTER_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(POSTER_RETRY_MIN_MS),
            max_delay: Duration::from_millis(POSTER_RETRY_MAX_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delays between attempts: `base, 2*base, 4*base, ...` capped at `max_delay`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_delay = self.max_delay;
        std::iter::once(self.base_delay)
            .chain(
                ExponentialBackoff::from_millis(2)
                    .factor(base_ms)
                    .max_delay(max_delay),
            )
            .map(move |delay| delay.min(max_delay))
            .take(self.max_attempts.saturating_sub(1))
    }

    /// Runs `operation`, retrying while the error is retryable.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// non-retryable error.
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T, RelayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RelayError>>,
    {
        RetryIf::spawn(self.delays(), operation, RelayError::is_retryable).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_default_delays() {
        let delays: Vec<_> = RetryPolicy::default().delays().collect();
        assert_eq!(
            delays,
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn test_delays_are_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        };
        let delays: Vec<_> = policy.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000]);
    }

    #[test]
    fn test_small_and_odd_base_delays() {
        let one_ms = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
        };
        let delays: Vec<_> = one_ms.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);

        let odd = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(3),
            max_delay: Duration::from_secs(1),
        };
        let delays: Vec<_> = odd.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![3, 6, 12]);
    }

    #[test]
    fn test_no_retry_has_no_delays() {
        assert_eq!(RetryPolicy::no_retry().delays().count(), 0);
    }

    #[tokio::test]
    async fn test_retries_transport_errors_until_success() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result = fast(3)
            .run(|| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RelayError::Timeout)
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast(3)
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RelayError::Network("refused".into()))
            })
            .await;

        assert_eq!(result, Err(RelayError::Network("refused".into())));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_protocol_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast(3)
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RelayError::Status(500))
            })
            .await;

        assert_eq!(result, Err(RelayError::Status(500)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
