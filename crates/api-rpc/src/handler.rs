//! RPC Method Handlers
//!
//! Translates wire requests into market service calls.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::types::{
    CancelOrderResponse, CreateMarketResponse, ExternalBook, ExternalOrder, ListMarketsResponse,
    MarketRequest, OrderRequest, StatsResponse, SubmitOrderResponse, SubmitRequest,
};
use alloy_primitives::Address;
use jsonrpsee::types::ErrorObjectOwned;
use ome_core::application::MarketService;
use ome_core::domain::external::{parse_address, parse_order_id};
use ome_core::domain::{ExternalFill, OrderId};
use ome_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    markets: Arc<MarketService>,
    rate_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(markets: Arc<MarketService>, limits: RateLimitConfig) -> Self {
        Self {
            markets,
            rate_limiter: RateLimiter::new(limits),
            start_time: Instant::now(),
        }
    }

    fn throttle(&self) -> RpcResult<()> {
        if self.rate_limiter.try_acquire() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// market.create.v1
    pub async fn create_market(&self, params: MarketRequest) -> RpcResult<CreateMarketResponse> {
        self.throttle()?;

        let market = parse_address(&params.market).map_err(|e| to_rpc_error(AppError::from(e)))?;
        self.markets
            .create_market(market)
            .await
            .map_err(to_rpc_error)?;

        Ok(CreateMarketResponse {
            market: market.to_string(),
            created: true,
        })
    }

    /// market.list.v1
    pub async fn list_markets(&self) -> RpcResult<ListMarketsResponse> {
        let markets = self.markets.markets().await;
        Ok(ListMarketsResponse {
            markets: markets.iter().map(ToString::to_string).collect(),
        })
    }

    /// book.get.v1
    pub async fn get_book(&self, params: MarketRequest) -> RpcResult<ExternalBook> {
        let market = parse_address(&params.market).map_err(|e| to_rpc_error(AppError::from(e)))?;
        let book = self.markets.book(market).await.map_err(to_rpc_error)?;
        Ok(ExternalBook::from(&book))
    }

    /// order.submit.v1
    pub async fn submit_order(&self, params: SubmitRequest) -> RpcResult<SubmitOrderResponse> {
        self.throttle()?;

        let result = self.markets.submit(params).await.map_err(to_rpc_error)?;

        info!(
            order_id = %result.order_id,
            status = %result.status,
            fills = result.matched.len(),
            "Order submitted"
        );

        Ok(SubmitOrderResponse {
            order_id: result.order_id.to_string(),
            status: result.status,
            fills: result.fills().iter().map(ExternalFill::from).collect(),
        })
    }

    /// order.get.v1
    pub async fn get_order(&self, params: OrderRequest) -> RpcResult<ExternalOrder> {
        let (market, id) = parse_order_ref(&params)?;
        let order = self.markets.order(market, id).await.map_err(to_rpc_error)?;
        Ok(ExternalOrder::from(&order))
    }

    /// order.cancel.v1
    pub async fn cancel_order(&self, params: OrderRequest) -> RpcResult<CancelOrderResponse> {
        self.throttle()?;

        let (market, id) = parse_order_ref(&params)?;
        let cancelled_at = self.markets.cancel(market, id).await.map_err(to_rpc_error)?;

        debug!(order_id = %id, market = %market, "Order cancelled");

        Ok(CancelOrderResponse {
            order_id: id.to_string(),
            cancelled_at: cancelled_at.timestamp(),
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> RpcResult<StatsResponse> {
        let stats = self.markets.stats().await;
        Ok(StatsResponse {
            markets: stats.markets,
            resting_orders: stats.resting_orders,
            forwarded: stats.forward.forwarded,
            retried: stats.forward.retried,
            dropped: stats.forward.dropped,
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }
}

fn parse_order_ref(params: &OrderRequest) -> RpcResult<(Address, OrderId)> {
    let market = parse_address(&params.market).map_err(|e| to_rpc_error(AppError::from(e)))?;
    let id = parse_order_id(&params.order_id).map_err(|e| to_rpc_error(AppError::from(e)))?;
    Ok((market, id))
}
