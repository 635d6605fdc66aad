//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from api-rpc crate. Amounts are decimal
//! strings, addresses and ids `0x` hex, times unix seconds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resting order as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub trader: String,
    pub market: String,
    pub side: String,
    pub price: String,
    pub quantity: String,
    pub remaining: String,
    pub expiration: i64,
    pub created: i64,
    pub signed_data: String,
}

/// One trade; `price` is the maker's price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub maker: String,
    pub taker: String,
    pub quantity: String,
    pub price: String,
}

/// Book snapshot, price levels keyed by decimal price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub market: String,
    pub bids: BTreeMap<String, Vec<Order>>,
    pub asks: BTreeMap<String, Vec<Order>>,
    pub ltp: String,
    pub depth: (usize, usize),
    pub crossed: bool,
    pub spread: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MarketRequest {
    pub market: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMarketResponse {
    pub market: String,
    pub created: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListMarketsResponse {
    pub markets: Vec<String>,
}

/// Request to submit a limit order
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOrderRequest {
    pub trader: String,
    pub market: String,
    /// `bid`/`buy` or `ask`/`sell`
    pub side: String,
    pub price: String,
    pub quantity: String,
    pub expiration: i64,
    /// Hex payload forwarded untouched to the executioner
    #[serde(default)]
    pub signed_data: String,
}

/// Response from submit; `status` is PLACED, PARTIAL_MATCH or FULL_MATCH
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_id: String,
    pub status: String,
    pub fills: Vec<Fill>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OrderRequest {
    pub market: String,
    pub order_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderResponse {
    pub order_id: String,
    pub cancelled_at: i64,
}

/// Engine statistics
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub markets: usize,
    pub resting_orders: usize,
    pub forwarded: u64,
    pub retried: u64,
    pub dropped: u64,
    pub uptime_seconds: u64,
}
