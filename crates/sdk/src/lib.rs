//! Tracer OME SDK - Rust Client Library
//!
//! Provides a typed client for the order matching engine's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use ome_sdk::{OmeClient, SubmitOrderRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to daemon
//!     let client = OmeClient::connect("http://127.0.0.1:8989").await?;
//!
//!     // Rest a bid
//!     let response = client.submit_order(SubmitOrderRequest {
//!         trader: "0x0000000000000000000000000000000000000001".to_string(),
//!         market: "0x00000000000000000000000000000000000000aa".to_string(),
//!         side: "bid".to_string(),
//!         price: "100".to_string(),
//!         quantity: "5".to_string(),
//!         expiration: 4_000_000_000,
//!         signed_data: String::new(),
//!     }).await?;
//!
//!     println!("Order {} {}", response.order_id, response.status);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::OmeClient;
pub use error::{Result, SdkError};
pub use types::{
    Book, CancelOrderResponse, CreateMarketResponse, Fill, Order, StatsResponse,
    SubmitOrderRequest, SubmitOrderResponse,
};
