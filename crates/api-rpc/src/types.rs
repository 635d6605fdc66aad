//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results (ADR-020).
//! Amounts are decimal strings, addresses and ids `0x` hex, times unix seconds.

use ome_core::domain::{ExternalFill, OrderStatus};
use serde::{Deserialize, Serialize};

pub use ome_core::application::SubmitRequest;
pub use ome_core::domain::{ExternalBook, ExternalOrder};

/// market.create.v1 / book.get.v1 - Address a market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRequest {
    pub market: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMarketResponse {
    pub market: String,
    pub created: bool,
}

/// market.list.v1 - List markets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMarketsResponse {
    pub markets: Vec<String>,
}

/// order.submit.v1 - Submit a limit order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub fills: Vec<ExternalFill>,
}

/// order.get.v1 / order.cancel.v1 - Address an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub market: String,
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderResponse {
    pub order_id: String,
    pub cancelled_at: i64,
}

/// admin.stats.v1 - Engine statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub markets: usize,
    pub resting_orders: usize,
    pub forwarded: u64,
    pub retried: u64,
    pub dropped: u64,
    pub uptime_seconds: u64,
}
