// Submit Use Case - request validation and order construction

use crate::domain::external::{
    parse_address, parse_bytes, parse_decimal, parse_side, parse_timestamp,
};
use crate::domain::Order;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest accepted `signed_data` payload (hex characters, prefix excluded)
pub const MAX_SIGNED_DATA_HEX_LEN: usize = 4096;

/// Submit request in wire form (decimal amounts, hex addresses, unix seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub trader: String,
    pub market: String,
    pub side: String,
    pub price: String,
    pub quantity: String,
    pub expiration: i64,
    #[serde(default)]
    pub signed_data: String,
}

/// Validate a submit request without touching any book
pub fn validate_request(req: &SubmitRequest, now: DateTime<Utc>) -> Result<()> {
    parse_address(&req.trader)?;
    parse_address(&req.market)?;
    parse_side(&req.side)?;

    if parse_decimal(&req.price)?.is_zero() {
        return Err(AppError::Validation("price must be positive".to_string()));
    }
    if parse_decimal(&req.quantity)?.is_zero() {
        return Err(AppError::Validation("quantity must be positive".to_string()));
    }

    let expiration = parse_timestamp(req.expiration)?;
    if expiration <= now {
        return Err(AppError::Validation(format!(
            "order expired at {}",
            expiration.to_rfc3339()
        )));
    }

    let hex_len = req.signed_data.trim().trim_start_matches("0x").len();
    if hex_len > MAX_SIGNED_DATA_HEX_LEN {
        return Err(AppError::Validation(format!(
            "signed_data too long ({} > {} hex chars)",
            hex_len, MAX_SIGNED_DATA_HEX_LEN
        )));
    }
    parse_bytes(&req.signed_data)?;

    Ok(())
}

/// Build the domain order for a validated request
///
/// # Arguments
///
/// * `req` - Submit request
/// * `created` - Arrival time (injected for determinism)
pub fn build_order(req: &SubmitRequest, created: DateTime<Utc>) -> Result<Order> {
    validate_request(req, created)?;

    Ok(Order::new(
        parse_address(&req.trader)?,
        parse_address(&req.market)?,
        parse_side(&req.side)?,
        parse_decimal(&req.price)?,
        parse_decimal(&req.quantity)?,
        parse_timestamp(req.expiration)?,
        created,
        parse_bytes(&req.signed_data)?,
    ))
}
