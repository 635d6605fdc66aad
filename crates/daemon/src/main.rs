//! Tracer Order Matching Engine - Main Entry Point
//! JSON-RPC order entry + settlement forwarder + expiry sweeper

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

// Import workspace crates
use ome_api_rpc::{RateLimitConfig, RpcServer, RpcServerConfig};
use ome_core::application::{
    forward_channel, shutdown_channel, ExpirySweeper, ForwardRetryPolicy, Forwarder,
    MarketService, MarketSettings,
};
use ome_core::error::AppError;
use ome_core::port::{Executioner, SystemTimeProvider};
use ome_infra_executioner::{ExecutionerConfig, HttpExecutioner};

use crate::config::DaemonConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (JSON via OME_LOG_FORMAT=json - ADR-050)
    telemetry::init_logging();

    info!("Tracer OME v{} starting...", VERSION);

    // 2. Load configuration
    let config = DaemonConfig::from_env().context("Invalid configuration")?;
    info!(
        rpc = %format!("{}:{}", config.rpc_host, config.rpc_port),
        executioner = %config.executioner_url,
        validate_orders = config.validate_orders,
        auto_create_markets = config.auto_create_markets,
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let executioner: Arc<dyn Executioner> = Arc::new(
        HttpExecutioner::new(ExecutionerConfig {
            base_url: config.executioner_url.clone(),
            timeout: config.executioner_timeout,
        })
        .context("Executioner client setup failed")?,
    );

    let (forward_tx, forward_rx) = forward_channel(config.forward_queue);
    let markets = Arc::new(MarketService::new(
        executioner.clone(),
        time_provider,
        forward_tx,
        MarketSettings {
            validate_orders: config.validate_orders,
            auto_create: config.auto_create_markets,
        },
    ));

    // 4. Pre-create configured markets
    for market in &config.markets {
        match markets.create_market(*market).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => warn!(market = %market, "Market listed twice"),
            Err(e) => return Err(e).context("Market setup failed"),
        }
    }

    // 5. Start Forwarder (settlement loop)
    info!("Starting forwarder...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let forwarder = Forwarder::new(
        executioner,
        ForwardRetryPolicy::new(config.forward_base_delay_ms, config.forward_max_attempts),
    );
    let forwarder_handle = tokio::spawn(async move {
        forwarder.run(forward_rx, shutdown_rx).await;
    });

    // 6. Start Expiry Sweeper
    let sweeper = ExpirySweeper::new(markets.clone(), config.prune_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_tx.token()));

    // 7. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
        rate_limit: RateLimitConfig {
            burst: config.rate_limit_burst,
            per_second: config.rate_limit_rate,
        },
    };
    let (rpc_handle, rpc_addr) = RpcServer::new(rpc_config, markets.clone())
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %rpc_addr, "System ready. Accepting orders");
    info!("Press Ctrl+C to shutdown");

    // 8. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 9. Graceful shutdown: stop intake first, then let the forwarder drain
    if let Err(e) = rpc_handle.stop() {
        error!(error = ?e, "RPC server stop failed");
    }
    rpc_handle.stopped().await;

    shutdown_tx.shutdown();
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, forwarder_handle)
        .await
        .is_err()
    {
        warn!("Forwarder did not stop within {:?}", SHUTDOWN_TIMEOUT);
    }
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, sweeper_handle).await;

    let stats = markets.stats().await;
    info!(
        forwarded = stats.forward.forwarded,
        dropped = stats.forward.dropped,
        resting_orders = stats.resting_orders,
        "Shutdown complete."
    );

    telemetry::shutdown();
    Ok(())
}
