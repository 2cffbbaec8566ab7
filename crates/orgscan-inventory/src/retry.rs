//! Bounded retry with linearly growing backoff

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::PerformanceConfig;

/// Error returned once every attempt of an operation has failed
///
/// `source` is the error of the final attempt, unchanged.
#[derive(Error, Debug, Clone)]
#[error("{operation} failed after {attempts} attempt(s): {source}")]
pub struct RetryError<E: std::error::Error + 'static> {
    /// Name of the operation, for diagnostics
    pub operation: String,
    /// Number of attempts made
    pub attempts: u32,
    /// Error of the final attempt
    #[source]
    pub source: E,
}

impl<E: std::error::Error + 'static> RetryError<E> {
    /// Unwrap the final attempt's error
    pub fn into_inner(self) -> E {
        self.source
    }
}

/// Retry policy
///
/// Runs an operation up to `max_attempts` times. After failed attempt `k`
/// (when another attempt remains) it waits `base_delay * k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Build from performance settings
    #[must_use]
    pub fn from_config(config: &PerformanceConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    /// Maximum number of attempts
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt` (1-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `op` under this policy
    ///
    /// Returns the first success. No further attempts are made after it.
    ///
    /// # Errors
    /// Returns `RetryError` carrying the last attempt's error when every
    /// attempt fails.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        operation = %operation,
                        attempt,
                        total_attempts = self.max_attempts,
                        error = %e,
                        "attempt failed"
                    );

                    if attempt >= self.max_attempts {
                        error!(
                            operation = %operation,
                            attempts = self.max_attempts,
                            error = %e,
                            "all attempts failed"
                        );
                        return Err(RetryError {
                            operation: operation.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    }

                    sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use orgscan_exec::ExecError;
    use tokio::time::Instant;

    use super::*;

    fn failure(attempt: u32) -> ExecError {
        ExecError::ConnectionFailed(format!("attempt {attempt}"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_makes_exactly_max_attempts() {
        let policy = RetryPolicy::new(4, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("always-fails", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(failure(n))
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.attempts, 4);
        assert_eq!(err.operation, "always-fails");
        assert_eq!(err.into_inner().to_string(), "connection failed: attempt 4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_circuits_on_first_success() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let value = policy
            .run("flaky", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(failure(n)) } else { Ok(n * 10) }
            })
            .await
            .unwrap();

        assert_eq!(value, 30);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_does_not_wait() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        let start = Instant::now();

        let value: Result<&str, RetryError<ExecError>> =
            policy.run("ok", || async { Ok("done") }).await;

        assert_eq!(value.unwrap(), "done");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts_only() {
        // 3 attempts at 100ms: waits of 100ms and 200ms, nothing after the last
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let start = Instant::now();
        let stamps = std::sync::Mutex::new(Vec::new());

        let result: Result<(), _> = policy
            .run("timed", || {
                stamps.lock().unwrap().push(start.elapsed());
                async { Err(failure(0)) }
            })
            .await;

        assert!(result.is_err());
        let stamps = stamps.into_inner().unwrap();
        assert_eq!(stamps.len(), 3);

        // timer wheel resolution is 1ms
        let near = |actual: Duration, expected_ms: u64| {
            actual >= Duration::from_millis(expected_ms)
                && actual < Duration::from_millis(expected_ms + 5)
        };
        assert_eq!(stamps[0], Duration::ZERO);
        assert!(near(stamps[1], 100), "second attempt at {:?}", stamps[1]);
        assert!(near(stamps[2], 300), "third attempt at {:?}", stamps[2]);
        assert!(near(start.elapsed(), 300));
    }

    #[test]
    fn test_delay_is_monotonic() {
        let policy = RetryPolicy::new(10, Duration::from_millis(250));
        let delays: Vec<Duration> = (1..10).map(|k| policy.delay_after(k)).collect();

        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(delays[0], Duration::from_millis(250));
        assert_eq!(delays[3], Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }
}
