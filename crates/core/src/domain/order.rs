//! Limit orders and their EIP-712 identity

use std::fmt;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// EIP-712 type string of a Tracer limit order
pub const FUNCTION_SIGNATURE: &str = "LimitOrder(uint256 amount,uint256 price,bool side,address user,uint256 expiration,address target_tracer)";

/// Pre-computed hash of the EIP-712 domain separator
pub const DOMAIN_HASH: B256 = B256::new([
    0x49, 0x85, 0x44, 0x90, 0xba, 0x36, 0xfb, 0xa3, 0x58, 0xfe, 0x10, 0x19, 0xf0, 0x97, 0xd8,
    0xb5, 0x66, 0xd0, 0x11, 0xcf, 0xb3, 0xfd, 0x67, 0xc6, 0xfc, 0xe6, 0xa4, 0x06, 0x24, 0x15,
    0x00, 0x34,
]);

/// EIP-191 prefix for typed structured data
pub const EIP712_MAGIC_PREFIX: [u8; 2] = [0x19, 0x01];

/// Order ID (EIP-712 digest of the order)
pub type OrderId = B256;

/// Market side of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Bid,
    Ask,
}

impl OrderSide {
    /// Single-byte encoding (`Bid = 0x00`, `Ask = 0x01`)
    pub fn as_byte(&self) -> u8 {
        match self {
            OrderSide::Bid => 0x00,
            OrderSide::Ask => 0x01,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Bid => OrderSide::Ask,
            OrderSide::Ask => OrderSide::Bid,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Bid => write!(f, "Bid"),
            OrderSide::Ask => write!(f, "Ask"),
        }
    }
}

impl std::str::FromStr for OrderSide {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bid" | "buy" => Ok(OrderSide::Bid),
            "ask" | "sell" => Ok(OrderSide::Ask),
            other => Err(DomainError::InvalidOrder(format!("unknown side '{}'", other))),
        }
    }
}

/// A limit order resting in (or submitted to) a Tracer market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub trader: Address,
    pub market: Address,
    pub side: OrderSide,
    pub price: U256,
    pub quantity: U256,
    pub remaining: U256,
    #[serde(with = "ts_seconds")]
    pub expiration: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub created: DateTime<Utc>,
    pub signed_data: Bytes,
}

impl Order {
    /// Create a new order with `remaining == quantity` and a computed ID
    ///
    /// # Arguments
    ///
    /// * `created` - Arrival timestamp (injected, not system time)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trader: Address,
        market: Address,
        side: OrderSide,
        price: U256,
        quantity: U256,
        expiration: DateTime<Utc>,
        created: DateTime<Utc>,
        signed_data: Bytes,
    ) -> Self {
        let id = order_digest(trader, market, side, price, quantity, expiration);

        Self {
            id,
            trader,
            market,
            side,
            price,
            quantity,
            remaining: quantity,
            expiration,
            created,
            signed_data,
        }
    }

    /// Reduce the unfilled amount by `amount`
    ///
    /// Overfilling is rejected and leaves the order untouched.
    pub fn fill(&mut self, amount: U256) -> Result<()> {
        if amount > self.remaining {
            return Err(DomainError::Overfill {
                id: self.id.to_string(),
                amount: amount.to_string(),
                remaining: self.remaining.to_string(),
            });
        }
        self.remaining -= amount;
        Ok(())
    }

    pub fn is_filled(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}] {} {}/{} @ {}",
            self.id, self.market, self.side, self.remaining, self.quantity, self.price
        )
    }
}

/// Compute the EIP-712 digest that identifies (and is signed for) an order
///
/// `keccak256(0x1901 ‖ DOMAIN_HASH ‖ keccak256(typehash ‖ abi(fields)))`
pub fn order_digest(
    trader: Address,
    market: Address,
    side: OrderSide,
    price: U256,
    quantity: U256,
    expiration: DateTime<Utc>,
) -> OrderId {
    let typehash = keccak256(FUNCTION_SIGNATURE.as_bytes());
    let expiration_secs = U256::from(expiration.timestamp().max(0) as u64);

    let mut encoded = Vec::with_capacity(32 * 7);
    encoded.extend_from_slice(typehash.as_slice());
    encoded.extend_from_slice(&quantity.to_be_bytes::<32>());
    encoded.extend_from_slice(&price.to_be_bytes::<32>());
    encoded.extend_from_slice(&U256::from(side.as_byte()).to_be_bytes::<32>());
    encoded.extend_from_slice(trader.into_word().as_slice());
    encoded.extend_from_slice(&expiration_secs.to_be_bytes::<32>());
    encoded.extend_from_slice(market.into_word().as_slice());
    let struct_hash = keccak256(&encoded);

    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(&EIP712_MAGIC_PREFIX);
    preimage.extend_from_slice(DOMAIN_HASH.as_slice());
    preimage.extend_from_slice(struct_hash.as_slice());
    keccak256(&preimage)
}
