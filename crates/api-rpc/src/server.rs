//! JSON-RPC Server
//!
//! Serves the order entry API over HTTP on localhost.

use crate::handler::RpcHandler;
use crate::rate_limiter::RateLimitConfig;
use crate::types::{MarketRequest, OrderRequest, SubmitRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use ome_core::application::MarketService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// ADR-020: RPC Server Configuration
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 8989;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks an ephemeral port
    pub port: u16,
    pub rate_limit: RateLimitConfig,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, markets: Arc<MarketService>) -> Self {
        let handler = Arc::new(RpcHandler::new(markets, config.rate_limit));
        Self { config, handler }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the running server's handle and the address actually bound.
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let mut module = RpcModule::new(());

        // Market APIs
        let handler = self.handler.clone();
        module
            .register_async_method("market.create.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: MarketRequest = params.parse()?;
                    handler.create_market(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("market.list.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.list_markets().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("book.get.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: MarketRequest = params.parse()?;
                    handler.get_book(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Order APIs
        let handler = self.handler.clone();
        module
            .register_async_method("order.submit.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SubmitRequest = params.parse()?;
                    handler.submit_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.get.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: OrderRequest = params.parse()?;
                    handler.get_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.cancel.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: OrderRequest = params.parse()?;
                    handler.cancel_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Admin APIs
        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.stats().await }
            })
            .map_err(|e| e.to_string())?;

        info!(
            addr = %local_addr,
            burst = self.config.rate_limit.burst,
            rate = self.config.rate_limit.per_second,
            "JSON-RPC server started"
        );

        let handle = server.start(module);
        Ok((handle, local_addr))
    }
}
