// Match outcomes

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::order::{Order, OrderId};

/// A single trade between a resting maker and an incoming taker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub maker: OrderId,
    pub taker: OrderId,
    pub quantity: U256,
    /// Always the maker's resting price
    pub price: U256,
}

/// Snapshot of both orders of a fill, as forwarded to the executioner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub maker: Order,
    pub taker: Order,
    pub quantity: U256,
    pub price: U256,
}

impl MatchedPair {
    pub fn fill(&self) -> Fill {
        Fill {
            maker: self.maker.id,
            taker: self.taker.id,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// Outcome of submitting an order to a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// No fills, the order rests in full
    Placed,
    /// Some fills, the remainder rests
    PartialMatch,
    /// Fully filled, nothing rests
    FullMatch,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Placed => write!(f, "PLACED"),
            OrderStatus::PartialMatch => write!(f, "PARTIAL_MATCH"),
            OrderStatus::FullMatch => write!(f, "FULL_MATCH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub matched: Vec<MatchedPair>,
}

impl MatchResult {
    pub fn fills(&self) -> Vec<Fill> {
        self.matched.iter().map(MatchedPair::fill).collect()
    }

    /// Total quantity traded by the incoming order
    pub fn traded(&self) -> U256 {
        self.matched
            .iter()
            .fold(U256::ZERO, |acc, pair| acc + pair.quantity)
    }
}
