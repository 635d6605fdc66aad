//! External (wire) representations of orders and books
//!
//! Prices and quantities travel as decimal strings, addresses and hashes as
//! `0x` hex, timestamps as unix seconds. Parsing never panics.

use std::collections::BTreeMap;
use std::str::FromStr;

use alloy_primitives::{hex, Address, Bytes, B256, U256};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::book::{Book, PriceLevels};
use super::fill::Fill;
use super::order::{Order, OrderSide};

/// Error in interpreting an external order or fill
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalParseError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid hexadecimal '{0}'")]
    InvalidHexadecimal(String),

    #[error("Invalid decimal '{0}'")]
    InvalidDecimal(String),

    #[error("Invalid side '{0}'")]
    InvalidSide(String),

    #[error("Invalid timestamp {0}")]
    InvalidTimestamp(i64),

    #[error("Remaining {remaining} exceeds quantity {quantity}")]
    InvalidRemaining { remaining: String, quantity: String },

    #[error("Order id {claimed} does not match its contents ({computed})")]
    IdMismatch { claimed: String, computed: String },
}

type ParseResult<T> = std::result::Result<T, ExternalParseError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrder {
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

impl From<&Order> for ExternalOrder {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            trader: order.trader.to_string(),
            market: order.market.to_string(),
            side: order.side.to_string(),
            price: order.price.to_string(),
            quantity: order.quantity.to_string(),
            remaining: order.remaining.to_string(),
            expiration: order.expiration.timestamp(),
            created: order.created.timestamp(),
            signed_data: hex::encode_prefixed(&order.signed_data),
        }
    }
}

impl TryFrom<ExternalOrder> for Order {
    type Error = ExternalParseError;

    fn try_from(value: ExternalOrder) -> ParseResult<Self> {
        let mut order = Order::new(
            parse_address(&value.trader)?,
            parse_address(&value.market)?,
            parse_side(&value.side)?,
            parse_decimal(&value.price)?,
            parse_decimal(&value.quantity)?,
            parse_timestamp(value.expiration)?,
            parse_timestamp(value.created)?,
            parse_bytes(&value.signed_data)?,
        );
        let remaining = parse_decimal(&value.remaining)?;
        if remaining > order.quantity {
            return Err(ExternalParseError::InvalidRemaining {
                remaining: remaining.to_string(),
                quantity: order.quantity.to_string(),
            });
        }
        order.remaining = remaining;

        let claimed = B256::from_str(&value.id)
            .map_err(|_| ExternalParseError::InvalidHexadecimal(value.id.clone()))?;
        if claimed != order.id {
            return Err(ExternalParseError::IdMismatch {
                claimed: claimed.to_string(),
                computed: order.id.to_string(),
            });
        }

        Ok(order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFill {
    pub maker: String,
    pub taker: String,
    pub quantity: String,
    pub price: String,
}

impl From<&Fill> for ExternalFill {
    fn from(fill: &Fill) -> Self {
        Self {
            maker: fill.maker.to_string(),
            taker: fill.taker.to_string(),
            quantity: fill.quantity.to_string(),
            price: fill.price.to_string(),
        }
    }
}

/// Book snapshot keyed by decimal price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBook {
    pub market: String,
    pub bids: BTreeMap<String, Vec<ExternalOrder>>,
    pub asks: BTreeMap<String, Vec<ExternalOrder>>,
    pub ltp: String,
    pub depth: (usize, usize),
    pub crossed: bool,
    pub spread: String,
}

impl From<&Book> for ExternalBook {
    fn from(book: &Book) -> Self {
        let levels = |side: &PriceLevels| -> BTreeMap<String, Vec<ExternalOrder>> {
            side.iter()
                .map(|(price, orders)| {
                    (
                        price.to_string(),
                        orders.iter().map(ExternalOrder::from).collect(),
                    )
                })
                .collect()
        };

        Self {
            market: book.market().to_string(),
            bids: levels(book.bids()),
            asks: levels(book.asks()),
            ltp: book.ltp().to_string(),
            depth: book.depth(),
            crossed: book.crossed(),
            spread: book.spread().to_string(),
        }
    }
}

pub fn parse_address(s: &str) -> ParseResult<Address> {
    Address::from_str(s.trim())
        .map_err(|_| ExternalParseError::InvalidAddress(s.to_string()))
}

pub fn parse_order_id(s: &str) -> ParseResult<B256> {
    B256::from_str(s.trim())
        .map_err(|_| ExternalParseError::InvalidHexadecimal(s.to_string()))
}

/// Parse a base-10 amount (no `0x` form accepted)
pub fn parse_decimal(s: &str) -> ParseResult<U256> {
    U256::from_str_radix(s.trim(), 10)
        .map_err(|_| ExternalParseError::InvalidDecimal(s.to_string()))
}

pub fn parse_side(s: &str) -> ParseResult<OrderSide> {
    OrderSide::from_str(s).map_err(|_| ExternalParseError::InvalidSide(s.to_string()))
}

pub fn parse_timestamp(secs: i64) -> ParseResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(ExternalParseError::InvalidTimestamp(secs))
}

pub fn parse_bytes(s: &str) -> ParseResult<Bytes> {
    if s.trim().is_empty() {
        return Ok(Bytes::new());
    }
    Bytes::from_str(s.trim()).map_err(|_| ExternalParseError::InvalidHexadecimal(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(
            Address::with_last_byte(7),
            Address::with_last_byte(8),
            OrderSide::Ask,
            U256::from(1_500u64),
            U256::from(20u64),
            Utc.timestamp_opt(1_900_000_000, 0).unwrap(),
            Utc.timestamp_opt(1_800_000_000, 0).unwrap(),
            Bytes::from(vec![0xde, 0xad]),
        )
    }

    #[test]
    fn test_external_order_uses_decimal_amounts() {
        let external = ExternalOrder::from(&order());
        assert_eq!(external.price, "1500");
        assert_eq!(external.quantity, "20");
        assert_eq!(external.side, "Ask");
        assert_eq!(external.signed_data, "0xdead");
        assert_eq!(external.expiration, 1_900_000_000);
    }

    #[test]
    fn test_external_order_converts_back() {
        let mut original = order();
        original.fill(U256::from(5u64)).unwrap();
        let parsed = Order::try_from(ExternalOrder::from(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_tampered_external_order_is_rejected() {
        let mut external = ExternalOrder::from(&order());
        external.price = "1501".to_string();
        assert!(matches!(
            Order::try_from(external),
            Err(ExternalParseError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_remaining_above_quantity_is_rejected() {
        let mut external = ExternalOrder::from(&order());
        external.remaining = "50".to_string();
        assert!(matches!(
            Order::try_from(external),
            Err(ExternalParseError::InvalidRemaining { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_decimal("0x10"),
            Err(ExternalParseError::InvalidDecimal(_))
        ));
        assert!(matches!(
            parse_address("0x1234"),
            Err(ExternalParseError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_side("long"),
            Err(ExternalParseError::InvalidSide(_))
        ));
        assert_eq!(parse_bytes("").unwrap(), Bytes::new());
    }
}
