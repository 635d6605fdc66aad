//! Tracer OME CLI - Command-line interface for the order matching engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8989";
const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Parser)]
#[command(name = "ome")]
#[command(about = "Tracer order matching engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "OME_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty market
    CreateMarket {
        /// Market address (0x...)
        market: String,
    },

    /// List markets
    Markets,

    /// Show a market's order book
    Book {
        /// Market address (0x...)
        market: String,
    },

    /// Submit a limit order
    Submit {
        /// Trader address (0x...)
        #[arg(short, long)]
        trader: String,

        /// Market address (0x...)
        #[arg(short, long)]
        market: String,

        /// bid/buy or ask/sell
        #[arg(short, long)]
        side: String,

        /// Limit price (decimal)
        #[arg(short, long)]
        price: String,

        /// Quantity (decimal)
        #[arg(short, long)]
        quantity: String,

        /// Expiry as unix seconds (default: one hour from now)
        #[arg(long)]
        expiration: Option<i64>,

        /// Signed order payload (hex)
        #[arg(long, default_value = "")]
        signed_data: String,
    },

    /// Show a resting order
    Order {
        /// Market address (0x...)
        market: String,
        /// Order ID (0x...)
        order_id: String,
    },

    /// Cancel a resting order
    Cancel {
        /// Market address (0x...)
        market: String,
        /// Order ID (0x...)
        order_id: String,
    },

    /// Show engine status
    Status,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct WireOrder {
    id: String,
    trader: String,
    side: String,
    price: String,
    quantity: String,
    remaining: String,
    expiration: i64,
}

#[derive(Deserialize)]
struct WireBook {
    market: String,
    bids: BTreeMap<String, Vec<WireOrder>>,
    asks: BTreeMap<String, Vec<WireOrder>>,
    ltp: String,
    depth: (usize, usize),
    crossed: bool,
    spread: String,
}

#[derive(Deserialize, Tabled)]
struct FillRow {
    maker: String,
    taker: String,
    quantity: String,
    price: String,
}

#[derive(Tabled)]
struct OrderRow {
    side: String,
    price: String,
    #[tabled(rename = "remaining/quantity")]
    size: String,
    id: String,
    trader: String,
}

impl OrderRow {
    fn from_wire(order: &WireOrder) -> Self {
        Self {
            side: order.side.clone(),
            price: order.price.clone(),
            size: format!("{}/{}", order.remaining, order.quantity),
            id: short(&order.id),
            trader: short(&order.trader),
        }
    }
}

fn short(hex: &str) -> String {
    if hex.len() > 14 {
        format!("{}…{}", &hex[..8], &hex[hex.len() - 4..])
    } else {
        hex.to_string()
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

/// Price levels from the highest price down
///
/// Keys are decimal strings without leading zeros, so longer means larger.
fn price_descending(levels: &BTreeMap<String, Vec<WireOrder>>) -> Vec<&Vec<WireOrder>> {
    let mut sorted: Vec<_> = levels.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| (b.len(), b.as_str()).cmp(&(a.len(), a.as_str())));
    sorted.into_iter().map(|(_, orders)| orders).collect()
}

fn print_book(book: &WireBook) {
    println!("{} {}", "Market".cyan().bold(), book.market);
    println!(
        "  {} {}   {} {}   {} {}/{}",
        "LTP:".bold(),
        book.ltp,
        "Spread:".bold(),
        book.spread,
        "Depth (bids/asks):".bold(),
        book.depth.0,
        book.depth.1
    );
    if book.crossed {
        println!("  {}", "Book is crossed (self-trades skipped)".yellow());
    }
    println!();

    // Asks from the top down, then bids from the best down
    let rows: Vec<OrderRow> = price_descending(&book.asks)
        .into_iter()
        .chain(price_descending(&book.bids))
        .flatten()
        .map(OrderRow::from_wire)
        .collect();

    if rows.is_empty() {
        println!("{}", "Book is empty".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CreateMarket { market } => {
            let result =
                call_rpc(&cli.rpc_url, "market.create.v1", json!({ "market": market })).await?;
            println!(
                "{}",
                format!("✓ Market {} created", result["market"].as_str().unwrap_or(&market))
                    .green()
                    .bold()
            );
        }

        Commands::Markets => {
            let result = call_rpc(&cli.rpc_url, "market.list.v1", json!({})).await?;
            let markets: Vec<String> = serde_json::from_value(result["markets"].clone())?;

            if markets.is_empty() {
                println!("{}", "No markets".yellow());
            }
            for market in markets {
                println!("{}", market);
            }
        }

        Commands::Book { market } => {
            let result = call_rpc(&cli.rpc_url, "book.get.v1", json!({ "market": market })).await?;
            let book: WireBook = serde_json::from_value(result)?;
            print_book(&book);
        }

        Commands::Submit {
            trader,
            market,
            side,
            price,
            quantity,
            expiration,
            signed_data,
        } => {
            let expiration =
                expiration.unwrap_or_else(|| chrono::Utc::now().timestamp() + DEFAULT_TTL_SECS);

            let params = json!({
                "trader": trader,
                "market": market,
                "side": side,
                "price": price,
                "quantity": quantity,
                "expiration": expiration,
                "signed_data": signed_data,
            });

            let result = call_rpc(&cli.rpc_url, "order.submit.v1", params).await?;
            let order_id = result["order_id"].as_str().unwrap_or_default().to_string();
            let status = result["status"].as_str().unwrap_or_default().to_string();
            let fills: Vec<FillRow> = serde_json::from_value(result["fills"].clone())?;

            let headline = format!("✓ Order {} {}", order_id, status);
            match status.as_str() {
                "FULL_MATCH" => println!("{}", headline.green().bold()),
                "PARTIAL_MATCH" => println!("{}", headline.yellow().bold()),
                _ => println!("{}", headline.bold()),
            }

            if !fills.is_empty() {
                println!();
                println!("{}", Table::new(fills));
            }
        }

        Commands::Order { market, order_id } => {
            let params = json!({ "market": market, "order_id": order_id });
            let result = call_rpc(&cli.rpc_url, "order.get.v1", params).await?;
            let order: WireOrder = serde_json::from_value(result)?;

            println!("{}", format!("Order {}", order.id).cyan().bold());
            println!("  {} {}", "Trader:".bold(), order.trader);
            println!("  {} {}", "Side:".bold(), order.side);
            println!("  {} {}", "Price:".bold(), order.price);
            println!(
                "  {} {}/{}",
                "Remaining:".bold(),
                order.remaining,
                order.quantity
            );
            println!("  {} {}", "Expires:".bold(), order.expiration);
        }

        Commands::Cancel { market, order_id } => {
            let params = json!({ "market": market, "order_id": order_id });
            let result = call_rpc(&cli.rpc_url, "order.cancel.v1", params).await?;

            println!(
                "{}",
                format!("✓ Order {} cancelled at {}", order_id, result["cancelled_at"])
                    .green()
                    .bold()
            );
        }

        Commands::Status => {
            println!("{}", "Engine Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Markets:".bold(), stats["markets"]);
                    println!("  {} {}", "Resting orders:".bold(), stats["resting_orders"]);
                    println!("  {} {}", "Settled:".bold(), stats["forwarded"]);
                    println!("  {} {}", "Retries:".bold(), stats["retried"]);
                    println!("  {} {}", "Dropped:".bold(), stats["dropped"]);
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
