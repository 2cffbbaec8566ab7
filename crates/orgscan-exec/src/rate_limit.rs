//! Sliding-window request limiter

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Maximum number of requests per time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window
    pub requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl RateLimit {
    /// Window as a duration
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests: 100,
            window_ms: 60_000,
        }
    }
}

/// Limits outgoing requests to `requests` per sliding `window`.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    sent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            sent: Mutex::new(VecDeque::new()),
        }
    }

    /// Configured limit
    #[must_use]
    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Wait until another request may be sent, then record it
    pub async fn acquire(&self) {
        let window = self.limit.window();
        let capacity = self.limit.requests.max(1) as usize;

        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();
                while let Some(oldest) = sent.front()
                    && now.duration_since(*oldest) >= window
                {
                    sent.pop_front();
                }

                if sent.len() < capacity {
                    sent.push_back(now);
                    return;
                }

                sent.front().map_or(Duration::ZERO, |oldest| {
                    window.saturating_sub(now.duration_since(*oldest))
                })
            };

            debug!(wait = ?wait, "rate limit reached, waiting");
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_under_limit_does_not_wait() {
        let limiter = RateLimiter::new(RateLimit {
            requests: 3,
            window_ms: 1_000,
        });

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_over_limit_waits_for_window() {
        let limiter = RateLimiter::new(RateLimit {
            requests: 2,
            window_ms: 1_000,
        });

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(1_000));
    }
}
