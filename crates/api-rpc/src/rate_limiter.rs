//! Rate Limiter (Token Bucket Algorithm)
//!
//! Guards the mutating RPC methods against floods of order traffic.

use std::sync::Mutex;
use std::time::Instant;

/// Burst size and sustained rate
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub burst: u32,
    pub per_second: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 200,
            per_second: 100,
        }
    }
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared by all connections
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    /// Allow 100 requests/sec with burst of 200:
    /// `RateLimiter::new(RateLimitConfig { burst: 200, per_second: 100 })`
    pub fn new(config: RateLimitConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    fn starting_at(config: RateLimitConfig, now: Instant) -> Self {
        let capacity = f64::from(config.burst.max(1));
        Self {
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: now,
            }),
            capacity,
            refill_per_sec: f64::from(config.per_second),
        }
    }

    /// Take one token if available
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut bucket = self
            .bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whole tokens currently available (for monitoring)
    pub fn remaining(&self) -> u32 {
        let bucket = self
            .bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        bucket.tokens.floor() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn config(burst: u32, per_second: u32) -> RateLimitConfig {
        RateLimitConfig { burst, per_second }
    }

    #[test]
    fn test_allows_burst_then_denies() {
        let start = Instant::now();
        let limiter = RateLimiter::starting_at(config(10, 10), start);

        for _ in 0..10 {
            assert!(limiter.try_acquire_at(start));
        }
        assert!(!limiter.try_acquire_at(start));
        assert_eq!(limiter.remaining(), 0);
    }

    #[test]
    fn test_refills_over_time() {
        let start = Instant::now();
        let limiter = RateLimiter::starting_at(config(5, 10), start);

        for _ in 0..5 {
            assert!(limiter.try_acquire_at(start));
        }
        assert!(!limiter.try_acquire_at(start));

        // 10 tokens/sec: 250ms buys two requests
        let later = start + Duration::from_millis(250);
        assert!(limiter.try_acquire_at(later));
        assert!(limiter.try_acquire_at(later));
        assert!(!limiter.try_acquire_at(later));
    }

    #[test]
    fn test_refill_capped_at_burst() {
        let start = Instant::now();
        let limiter = RateLimiter::starting_at(config(3, 100), start);

        let much_later = start + Duration::from_secs(60);
        let allowed = (0..10).filter(|_| limiter.try_acquire_at(much_later)).count();
        assert_eq!(allowed, 3);
    }

    #[test]
    fn test_zero_rate_never_refills() {
        let start = Instant::now();
        let limiter = RateLimiter::starting_at(config(1, 0), start);

        assert!(limiter.try_acquire_at(start));
        assert!(!limiter.try_acquire_at(start + Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_bucket() {
        let limiter = Arc::new(RateLimiter::new(config(100, 1)));

        let mut handles = vec![];
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                (0..20).filter(|_| limiter.try_acquire()).count()
            }));
        }

        let mut total_allowed = 0;
        for handle in handles {
            total_allowed += handle.await.unwrap();
        }

        // 200 attempts against a burst of 100 and a trickle refill
        assert!(
            (100..=102).contains(&total_allowed),
            "Expected about 100 allowed, got {}",
            total_allowed
        );
    }
}
