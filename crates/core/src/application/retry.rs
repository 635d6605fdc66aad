// Retry policy for settlement forwarding
use crate::application::forwarder::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_FORWARD_BASE_DELAY_MS, DEFAULT_FORWARD_MAX_ATTEMPTS,
    MAX_BACKOFF_DELAY_MS,
};
use crate::domain::MatchedPair;
use std::time::Duration;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after the given delay
    Retry(Duration),
    /// Attempts exhausted, drop the pair
    GiveUp,
}

/// Exponential backoff for failed `send_matched_orders` calls
///
/// delay = base_delay * (backoff_factor ^ (attempt - 1)), capped, with ±10% jitter
#[derive(Debug, Clone)]
pub struct ForwardRetryPolicy {
    base_delay_ms: u64,
    backoff_factor: f64,
    max_attempts: u32,
}

impl Default for ForwardRetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FORWARD_BASE_DELAY_MS, DEFAULT_FORWARD_MAX_ATTEMPTS)
    }
}

impl ForwardRetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `base_delay_ms` - Delay before the first retry
    /// * `max_attempts` - Total attempts per pair, the first one included
    pub fn new(base_delay_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_delay_ms,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what to do after `attempts` failed attempts for `pair`
    pub fn should_retry(&self, pair: &MatchedPair, attempts: u32) -> RetryDecision {
        if attempts >= self.max_attempts {
            warn!(
                maker = %pair.maker.id,
                taker = %pair.taker.id,
                attempts,
                max_attempts = self.max_attempts,
                "Max forward attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        let exponent = attempts.saturating_sub(1) as i32;
        let raw_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);

        // Deterministic jitter per pair, seeded by the maker id
        let seed: u32 = pair.maker.id.iter().map(|b| *b as u32).sum();
        let jitter_factor = 0.9 + ((seed % 21) as f64 / 100.0);

        let delay_ms = ((raw_ms * jitter_factor) as u64).min(MAX_BACKOFF_DELAY_MS);

        info!(
            maker = %pair.maker.id,
            attempt = attempts,
            delay_ms,
            "Scheduling forward retry"
        );

        RetryDecision::Retry(Duration::from_millis(delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, OrderSide};
    use alloy_primitives::{Address, Bytes, U256};
    use chrono::{TimeZone, Utc};

    fn pair() -> MatchedPair {
        let order = |trader: u8, side| {
            Order::new(
                Address::with_last_byte(trader),
                Address::with_last_byte(9),
                side,
                U256::from(10u64),
                U256::from(1u64),
                Utc.timestamp_opt(2_000_000_000, 0).unwrap(),
                Utc.timestamp_opt(1_000_000_000, 0).unwrap(),
                Bytes::new(),
            )
        };
        MatchedPair {
            maker: order(1, OrderSide::Ask),
            taker: order(2, OrderSide::Bid),
            quantity: U256::from(1u64),
            price: U256::from(10u64),
        }
    }

    fn delay_ms(decision: RetryDecision) -> u64 {
        match decision {
            RetryDecision::Retry(delay) => delay.as_millis() as u64,
            RetryDecision::GiveUp => panic!("expected retry"),
        }
    }

    #[test]
    fn test_backoff_grows_within_jitter() {
        let policy = ForwardRetryPolicy::new(1000, 5);
        let pair = pair();

        let first = delay_ms(policy.should_retry(&pair, 1));
        let second = delay_ms(policy.should_retry(&pair, 2));
        let third = delay_ms(policy.should_retry(&pair, 3));

        assert!((900..=1100).contains(&first), "first = {}", first);
        assert!((1800..=2200).contains(&second), "second = {}", second);
        assert!((3600..=4400).contains(&third), "third = {}", third);
    }

    #[test]
    fn test_jitter_is_deterministic() {
        let policy = ForwardRetryPolicy::new(1000, 5);
        let pair = pair();
        assert_eq!(policy.should_retry(&pair, 2), policy.should_retry(&pair, 2));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let policy = ForwardRetryPolicy::new(10, 3);
        let pair = pair();
        assert!(matches!(policy.should_retry(&pair, 2), RetryDecision::Retry(_)));
        assert_eq!(policy.should_retry(&pair, 3), RetryDecision::GiveUp);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = ForwardRetryPolicy::new(30_000, 20);
        let pair = pair();
        assert_eq!(delay_ms(policy.should_retry(&pair, 10)), MAX_BACKOFF_DELAY_MS);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = ForwardRetryPolicy::new(10, 0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.should_retry(&pair(), 1), RetryDecision::GiveUp);
    }
}
