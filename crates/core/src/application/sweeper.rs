// Expiry Sweeper
// Periodically removes expired resting orders from every book

use crate::application::forwarder::ShutdownToken;
use crate::application::market::MarketService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

pub struct ExpirySweeper {
    markets: Arc<MarketService>,
    period: Duration,
}

impl ExpirySweeper {
    /// # Arguments
    /// * `markets` - Market service whose books are swept
    /// * `period` - Time between sweeps
    pub fn new(markets: Arc<MarketService>, period: Duration) -> Self {
        Self { markets, period }
    }

    /// Sweep loop (background task), runs until shutdown
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(period_secs = self.period.as_secs(), "Expiry sweeper started");

        let mut tick = interval(self.period.max(Duration::from_millis(10)));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {},
                _ = shutdown.wait() => break,
            }

            let removed = self.sweep_now().await;
            debug!(removed, "Expiry sweep completed");
        }

        info!("Expiry sweeper stopped");
    }

    /// Sweep immediately (for manual trigger)
    pub async fn sweep_now(&self) -> usize {
        self.markets.prune_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::forwarder::{forward_channel, shutdown_channel};
    use crate::application::market::{MarketSettings, SubmitRequest};
    use crate::port::executioner::mocks::MockExecutioner;
    use crate::port::FixedTimeProvider;
    use chrono::{TimeZone, Utc};

    const START: i64 = 1_700_000_000;

    fn service(clock: Arc<FixedTimeProvider>) -> Arc<MarketService> {
        let (tx, _rx) = forward_channel(8);
        Arc::new(MarketService::new(
            Arc::new(MockExecutioner::accepting()),
            clock,
            tx,
            MarketSettings::default(),
        ))
    }

    fn resting_bid(expiration: i64) -> SubmitRequest {
        SubmitRequest {
            trader: "0x0000000000000000000000000000000000000001".to_string(),
            market: "0x00000000000000000000000000000000000000aa".to_string(),
            side: "bid".to_string(),
            price: "10".to_string(),
            quantity: "1".to_string(),
            expiration,
            signed_data: String::new(),
        }
    }

    #[test]
    fn test_sweep_now_prunes_expired() {
        tokio_test::block_on(async {
            let clock = Arc::new(FixedTimeProvider::new(Utc.timestamp_opt(START, 0).unwrap()));
            let markets = service(clock.clone());
            markets.submit(resting_bid(START + 60)).await.unwrap();

            let sweeper = ExpirySweeper::new(markets.clone(), Duration::from_secs(1));
            assert_eq!(sweeper.sweep_now().await, 0);

            clock.advance(chrono::Duration::seconds(60));
            assert_eq!(sweeper.sweep_now().await, 1);
            assert_eq!(markets.stats().await.resting_orders, 0);
        });
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let clock = Arc::new(FixedTimeProvider::new(Utc.timestamp_opt(START, 0).unwrap()));
        let sweeper = ExpirySweeper::new(service(clock), Duration::from_millis(10));
        let (stop, token) = shutdown_channel();

        let handle = tokio::spawn(sweeper.run(token));
        tokio::time::sleep(Duration::from_millis(30)).await;
        stop.shutdown();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
