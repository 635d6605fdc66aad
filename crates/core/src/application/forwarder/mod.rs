// Forwarder - settlement loop for matched pairs
//
// The matching path never waits on the executioner: matched pairs are pushed
// onto a bounded queue and settled here, one at a time, in match order.

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::retry::{ForwardRetryPolicy, RetryDecision};
use crate::domain::MatchedPair;
use crate::port::Executioner;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Settlement counters shared by the queue and the forwarder
#[derive(Debug, Default)]
pub struct ForwardStats {
    forwarded: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForwardStatsSnapshot {
    pub forwarded: u64,
    pub retried: u64,
    pub dropped: u64,
}

impl ForwardStats {
    pub fn snapshot(&self) -> ForwardStatsSnapshot {
        ForwardStatsSnapshot {
            forwarded: self.forwarded.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Producer side of the forward queue (held by the market service)
#[derive(Clone)]
pub struct ForwardSender {
    tx: mpsc::Sender<MatchedPair>,
    stats: Arc<ForwardStats>,
}

impl ForwardSender {
    /// Enqueue a pair without waiting
    ///
    /// Returns false (and counts the pair as dropped) if the queue is full or
    /// the forwarder has stopped.
    pub fn enqueue(&self, pair: MatchedPair) -> bool {
        match self.tx.try_send(pair) {
            Ok(()) => true,
            Err(TrySendError::Full(pair)) => {
                error!(
                    maker = %pair.maker.id,
                    taker = %pair.taker.id,
                    "Forward queue full, dropping matched pair"
                );
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Closed(pair)) => {
                error!(
                    maker = %pair.maker.id,
                    taker = %pair.taker.id,
                    "Forwarder stopped, dropping matched pair"
                );
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn stats(&self) -> ForwardStatsSnapshot {
        self.stats.snapshot()
    }
}

/// Consumer side of the forward queue
pub struct ForwardReceiver {
    rx: mpsc::Receiver<MatchedPair>,
    stats: Arc<ForwardStats>,
}

/// Create a bounded forward queue
pub fn forward_channel(capacity: usize) -> (ForwardSender, ForwardReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let stats = Arc::new(ForwardStats::default());
    (
        ForwardSender {
            tx,
            stats: stats.clone(),
        },
        ForwardReceiver { rx, stats },
    )
}

/// Settles matched pairs through the executioner, retrying with backoff
pub struct Forwarder {
    executioner: Arc<dyn Executioner>,
    retry_policy: ForwardRetryPolicy,
}

impl Forwarder {
    pub fn new(executioner: Arc<dyn Executioner>, retry_policy: ForwardRetryPolicy) -> Self {
        Self {
            executioner,
            retry_policy,
        }
    }

    /// Run until shutdown or until every sender is dropped
    ///
    /// On shutdown, pairs already queued are still attempted once each.
    pub async fn run(&self, mut queue: ForwardReceiver, mut shutdown: ShutdownToken) {
        info!(
            max_attempts = self.retry_policy.max_attempts(),
            "Forwarder started"
        );

        loop {
            let next = tokio::select! {
                _ = shutdown.wait() => break,
                next = queue.rx.recv() => next,
            };

            match next {
                Some(pair) => self.forward(pair, &queue.stats, &mut shutdown).await,
                None => {
                    info!("Forward queue closed");
                    break;
                }
            }
        }

        let mut drained = 0usize;
        while let Ok(pair) = queue.rx.try_recv() {
            self.forward(pair, &queue.stats, &mut shutdown).await;
            drained += 1;
        }

        let stats = queue.stats.snapshot();
        info!(
            drained,
            forwarded = stats.forwarded,
            retried = stats.retried,
            dropped = stats.dropped,
            "Forwarder stopped"
        );
    }

    /// Settle one pair, retrying until success, give-up or shutdown
    async fn forward(&self, pair: MatchedPair, stats: &ForwardStats, shutdown: &mut ShutdownToken) {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self
                .executioner
                .send_matched_orders(&pair.maker, &pair.taker)
                .await
            {
                Ok(tx_hash) => {
                    info!(
                        maker = %pair.maker.id,
                        taker = %pair.taker.id,
                        tx_hash = %tx_hash,
                        attempts,
                        "Matched pair settled"
                    );
                    stats.forwarded.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(e) => {
                    warn!(
                        maker = %pair.maker.id,
                        taker = %pair.taker.id,
                        attempts,
                        error = %e,
                        "Settlement attempt failed"
                    );

                    let delay = match self.retry_policy.should_retry(&pair, attempts) {
                        RetryDecision::Retry(delay) if !shutdown.is_shutdown() => delay,
                        _ => {
                            error!(
                                maker = %pair.maker.id,
                                taker = %pair.taker.id,
                                "Dropping matched pair"
                            );
                            stats.dropped.fetch_add(1, Ordering::Relaxed);
                            return;
                        }
                    };

                    stats.retried.fetch_add(1, Ordering::Relaxed);
                    tokio::select! {
                        _ = sleep(delay) => {},
                        _ = shutdown.wait() => {
                            warn!(
                                maker = %pair.maker.id,
                                "Shutdown during backoff, dropping matched pair"
                            );
                            stats.dropped.fetch_add(1, Ordering::Relaxed);
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, OrderSide};
    use crate::port::executioner::mocks::{MockBehavior, MockExecutioner};
    use alloy_primitives::{Address, Bytes, U256};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn pair(seed: u8) -> MatchedPair {
        let order = |trader: u8, side| {
            Order::new(
                Address::with_last_byte(trader),
                Address::with_last_byte(0x42),
                side,
                U256::from(10u64),
                U256::from(seed as u64 + 1),
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

    #[tokio::test]
    async fn test_forwards_in_queue_order() {
        let executioner = Arc::new(MockExecutioner::accepting());
        let forwarder = Forwarder::new(executioner.clone(), ForwardRetryPolicy::new(1, 3));
        let (tx, rx) = forward_channel(8);
        let (_stop, token) = shutdown_channel();

        let pairs: Vec<_> = (0..3).map(pair).collect();
        for p in &pairs {
            assert!(tx.enqueue(p.clone()));
        }
        drop(tx);

        forwarder.run(rx, token).await;

        let expected: Vec<_> = pairs.iter().map(|p| (p.maker.id, p.taker.id)).collect();
        assert_eq!(executioner.settled(), expected);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let executioner = Arc::new(MockExecutioner::new(MockBehavior::FailFirst(2)));
        let forwarder = Forwarder::new(executioner.clone(), ForwardRetryPolicy::new(1, 5));
        let (tx, rx) = forward_channel(8);
        let (_stop, token) = shutdown_channel();
        let stats_view = tx.clone();

        tx.enqueue(pair(0));
        drop(tx);
        forwarder.run(rx, token).await;

        assert_eq!(executioner.send_attempts(), 3);
        let stats = stats_view.stats();
        assert_eq!(stats.forwarded, 1);
        assert_eq!(stats.retried, 2);
        assert_eq!(stats.dropped, 0);
    }

    #[tokio::test]
    async fn test_drops_after_max_attempts() {
        let executioner = Arc::new(MockExecutioner::new(MockBehavior::AlwaysFail));
        let forwarder = Forwarder::new(executioner.clone(), ForwardRetryPolicy::new(1, 3));
        let (tx, rx) = forward_channel(8);
        let (_stop, token) = shutdown_channel();
        let stats_view = tx.clone();

        tx.enqueue(pair(0));
        drop(tx);
        forwarder.run(rx, token).await;

        assert_eq!(executioner.send_attempts(), 3);
        assert_eq!(stats_view.stats().dropped, 1);
        assert!(executioner.settled().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_counts_dropped() {
        let (tx, _rx) = forward_channel(1);
        assert!(tx.enqueue(pair(0)));
        assert!(!tx.enqueue(pair(1)));
        assert_eq!(tx.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_forwarder() {
        let executioner = Arc::new(MockExecutioner::accepting());
        let forwarder = Forwarder::new(executioner, ForwardRetryPolicy::default());
        let (_tx, rx) = forward_channel(8);
        let (stop, token) = shutdown_channel();

        let handle = tokio::spawn(async move { forwarder.run(rx, token).await });
        stop.shutdown();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
