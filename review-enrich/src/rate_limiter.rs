//! Minimum-interval rate limiter
//!
//! One limiter per external service. Callers are sequential, so there is no
//! waiter queue: `acquire` just sleeps until the interval since the previous
//! return has elapsed.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Spaces successive `acquire` returns by at least `min_interval`
#[derive(Debug)]
pub struct RateLimiter {
    service: String,
    min_interval: Duration,
    last_return: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(service: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            service: service.into(),
            min_interval,
            last_return: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Wait if necessary to comply with the rate limit
    ///
    /// The first call returns immediately.
    pub async fn acquire(&self) {
        let mut last = self.last_return.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!(
                    service = %self.service,
                    wait_ms = wait_time.as_millis() as u64,
                    "Rate limiting: waiting before request"
                );
                sleep(wait_time).await;
            }
        }

        // Stamp after sleeping so the interval is measured between returns
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new("musicbrainz", Duration::from_millis(1000));
        assert_eq!(limiter.min_interval(), Duration::from_millis(1000));
        assert_eq!(limiter.service(), "musicbrainz");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new("musicbrainz", Duration::from_millis(500));

        let start = Instant::now();

        // First request - no wait
        limiter.acquire().await;
        let first = start.elapsed();

        // Second request - should wait 500ms
        limiter.acquire().await;
        let second = start.elapsed();

        // Third request - another 500ms
        limiter.acquire().await;
        let third = start.elapsed();

        assert!(first < Duration::from_millis(1));
        assert!(second >= Duration::from_millis(500));
        assert!(third >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_has_passed() {
        let limiter = RateLimiter::new("review-source", Duration::from_millis(400));

        limiter.acquire().await;
        tokio::time::advance(Duration::from_millis(600)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successive_returns_never_closer_than_interval() {
        let interval = Duration::from_millis(250);
        let limiter = RateLimiter::new("musicbrainz", interval);

        let mut returns = Vec::new();
        for step in 0..6u64 {
            // Irregular caller work between requests
            tokio::time::advance(Duration::from_millis(step * 70)).await;
            limiter.acquire().await;
            returns.push(Instant::now());
        }

        for pair in returns.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let limiter = RateLimiter::new("test", Duration::ZERO);
        let start = std::time::Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
