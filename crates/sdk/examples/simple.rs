//! Simple SDK Example
//!
//! Crosses two orders on a fresh market and prints the resulting book.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package ome-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package ome-sdk --example simple
//!    ```

use ome_sdk::{OmeClient, SubmitOrderRequest};

const MARKET: &str = "0x00000000000000000000000000000000000000aa";
const ALICE: &str = "0x0000000000000000000000000000000000000001";
const BOB: &str = "0x0000000000000000000000000000000000000002";

fn order(trader: &str, side: &str, price: &str, quantity: &str) -> SubmitOrderRequest {
    SubmitOrderRequest {
        trader: trader.to_string(),
        market: MARKET.to_string(),
        side: side.to_string(),
        price: price.to_string(),
        quantity: quantity.to_string(),
        expiration: 4_000_000_000,
        signed_data: String::new(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Tracer OME SDK - Simple Example");
    println!("===============================\n");

    // 1. Connect to daemon
    let client = OmeClient::connect("http://127.0.0.1:8989").await?;
    println!("1. Connected\n");

    // 2. Rest an ask
    let ask = client.submit_order(order(ALICE, "ask", "100", "5")).await?;
    println!("2. Ask {} -> {}\n", ask.order_id, ask.status);

    // 3. Cross it with a bid
    let bid = client.submit_order(order(BOB, "bid", "105", "3")).await?;
    println!("3. Bid {} -> {}", bid.order_id, bid.status);
    for fill in &bid.fills {
        println!("     - {} @ {}", fill.quantity, fill.price);
    }
    println!();

    // 4. Inspect the book
    let book = client.book(MARKET).await?;
    println!("4. Book: ltp={} depth={:?} spread={}", book.ltp, book.depth, book.spread);
    for (price, orders) in &book.asks {
        for o in orders {
            println!("     ask {} {}/{}", price, o.remaining, o.quantity);
        }
    }

    Ok(())
}
