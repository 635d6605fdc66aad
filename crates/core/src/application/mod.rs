// Application Layer - Use Cases and Business Logic

pub mod forwarder;
pub mod market;
pub mod retry;
pub mod sweeper;

// Re-exports
pub use forwarder::{forward_channel, shutdown_channel, Forwarder, ShutdownSender, ShutdownToken};
pub use market::{MarketService, MarketSettings, MarketStats, SubmitRequest};
pub use retry::ForwardRetryPolicy;
pub use sweeper::ExpirySweeper;
