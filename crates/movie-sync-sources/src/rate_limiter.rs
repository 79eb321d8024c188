//! Token bucket guarding outbound metadata API calls.
//!
//! The bucket is topped off to capacity (not refilled proportionally) the
//! first time it is checked after the refill interval has elapsed. Callers
//! never take a token that would leave fewer than `reserve` tokens behind;
//! they poll until a refill makes room instead.

use movie_sync_config::RateLimitConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl Bucket {
    /// Lazy refill, returns the tokens available after it
    fn available(&mut self, capacity: u32, refill_interval: Duration, now: Instant) -> u32 {
        if self.tokens < capacity && now.duration_since(self.last_refill) > refill_interval {
            self.tokens = capacity;
            self.last_refill = now;
        }
        self.tokens
    }
}

pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    capacity: u32,
    reserve: u32,
    refill_interval: Duration,
    poll_interval: Duration,
}

impl RateLimiter {
    pub fn new(capacity: u32, refill_interval: Duration, reserve: u32, poll_interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            // Must stay within 1..=capacity
            reserve: reserve.clamp(1, capacity),
            refill_interval,
            poll_interval,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.capacity,
            Duration::from_secs(config.refill_interval_secs),
            config.reserve,
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    /// Wait until a token can be spent, then spend it
    ///
    /// The check and the decrement happen under one lock, so concurrent
    /// callers never spend the same token.
    pub async fn acquire(&self) {
        let mut waited = false;
        loop {
            {
                let mut bucket = self.bucket.lock().await;
                let available = bucket.available(self.capacity, self.refill_interval, Instant::now());
                if available >= self.reserve {
                    bucket.tokens -= 1;
                    return;
                }
            }
            if !waited {
                trace!(operation = "rate_limit_wait", "Metadata API tokens exhausted, waiting for refill");
                waited = true;
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Tokens currently in the bucket (after a lazy refill)
    pub async fn available_tokens(&self) -> u32 {
        let mut bucket = self.bucket.lock().await;
        bucket.available(self.capacity, self.refill_interval, Instant::now())
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tokens that can be spent from a full bucket before callers start waiting
    pub fn burst_size(&self) -> u32 {
        self.capacity - self.reserve + 1
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_block_until_refill() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.burst_size(), 28);

        let start = Instant::now();
        for _ in 0..limiter.burst_size() {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.available_tokens().await, 2);

        limiter.acquire().await;
        let waited = start.elapsed();
        assert!(waited > Duration::from_secs(10), "waited only {:?}", waited);
        assert!(waited < Duration::from_secs(11), "waited {:?}", waited);
        assert_eq!(limiter.available_tokens().await, 29);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_full_top_off() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10), 1, Duration::from_millis(300));
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.available_tokens().await, 3);

        // Refill only once the interval is strictly exceeded
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(limiter.available_tokens().await, 3);
        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(limiter.available_tokens().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reserve_of_one_spends_whole_bucket() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10), 1, Duration::from_millis(300));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.available_tokens().await, 0);

        limiter.acquire().await;
        assert!(start.elapsed() > Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_overspend() {
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(10), 3, Duration::from_millis(300)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                start.elapsed()
            }));
        }

        let mut immediate = 0;
        for handle in handles {
            let elapsed = handle.await.unwrap();
            if elapsed == Duration::ZERO {
                immediate += 1;
            }
        }

        assert_eq!(immediate, limiter.burst_size() as usize);
        let tokens = limiter.available_tokens().await;
        assert!(tokens <= limiter.capacity());
    }

    #[tokio::test]
    async fn test_reserve_is_clamped() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10), 5, Duration::from_millis(300));
        assert_eq!(limiter.burst_size(), 1);

        let limiter = RateLimiter::new(0, Duration::from_secs(10), 0, Duration::from_millis(300));
        assert_eq!(limiter.capacity(), 1);
        assert_eq!(limiter.burst_size(), 1);
    }
}
