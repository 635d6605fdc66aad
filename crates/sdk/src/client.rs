//! OME Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    Book, CancelOrderResponse, CreateMarketResponse, ListMarketsResponse, MarketRequest, Order,
    OrderRequest, StatsResponse, SubmitOrderRequest, SubmitOrderResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Serialize;
use std::time::Duration;

/// Tracer OME Client
///
/// Provides a high-level interface to the order matching engine daemon.
///
/// # Example
///
/// ```no_run
/// use ome_sdk::OmeClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OmeClient::connect("http://127.0.0.1:8989").await?;
/// for market in client.list_markets().await? {
///     println!("{}", market);
/// }
/// # Ok(())
/// # }
/// ```
pub struct OmeClient {
    client: HttpClient,
}

impl OmeClient {
    /// Connect to the OME daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:8989`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create an empty market
    pub async fn create_market(&self, market: impl Into<String>) -> Result<CreateMarketResponse> {
        let params = named(&MarketRequest {
            market: market.into(),
        })?;
        Ok(self.client.request("market.create.v1", params).await?)
    }

    /// Addresses of all markets, sorted
    pub async fn list_markets(&self) -> Result<Vec<String>> {
        let response: ListMarketsResponse =
            self.client.request("market.list.v1", rpc_params![]).await?;
        Ok(response.markets)
    }

    /// Snapshot of a market's book
    pub async fn book(&self, market: impl Into<String>) -> Result<Book> {
        let params = named(&MarketRequest {
            market: market.into(),
        })?;
        Ok(self.client.request("book.get.v1", params).await?)
    }

    /// Submit a limit order
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ome_sdk::{OmeClient, SubmitOrderRequest};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = OmeClient::connect("http://127.0.0.1:8989").await?;
    /// let response = client.submit_order(SubmitOrderRequest {
    ///     trader: "0x0000000000000000000000000000000000000002".to_string(),
    ///     market: "0x00000000000000000000000000000000000000aa".to_string(),
    ///     side: "ask".to_string(),
    ///     price: "101".to_string(),
    ///     quantity: "3".to_string(),
    ///     expiration: 4_000_000_000,
    ///     signed_data: "0x".to_string(),
    /// }).await?;
    ///
    /// for fill in response.fills {
    ///     println!("{} @ {}", fill.quantity, fill.price);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_order(&self, request: SubmitOrderRequest) -> Result<SubmitOrderResponse> {
        let params = named(&request)?;
        Ok(self.client.request("order.submit.v1", params).await?)
    }

    /// Look up a resting order
    pub async fn order(
        &self,
        market: impl Into<String>,
        order_id: impl Into<String>,
    ) -> Result<Order> {
        let params = named(&OrderRequest {
            market: market.into(),
            order_id: order_id.into(),
        })?;
        Ok(self.client.request("order.get.v1", params).await?)
    }

    /// Cancel a resting order
    pub async fn cancel_order(
        &self,
        market: impl Into<String>,
        order_id: impl Into<String>,
    ) -> Result<CancelOrderResponse> {
        let params = named(&OrderRequest {
            market: market.into(),
            order_id: order_id.into(),
        })?;
        Ok(self.client.request("order.cancel.v1", params).await?)
    }

    /// Engine statistics
    pub async fn stats(&self) -> Result<StatsResponse> {
        Ok(self.client.request("admin.stats.v1", rpc_params![]).await?)
    }
}

/// Serialize a request struct as by-name params
fn named<T: Serialize>(request: &T) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    if let serde_json::Value::Object(fields) = serde_json::to_value(request)? {
        for (name, value) in fields {
            params.insert(&name, value)?;
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::core::traits::ToRpcParams;

    #[test]
    fn test_named_params_are_an_object() {
        let params = named(&OrderRequest {
            market: "0xaa".to_string(),
            order_id: "0x01".to_string(),
        })
        .unwrap();

        let raw = params.to_rpc_params().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(raw.get()).unwrap();
        assert_eq!(value["market"], "0xaa");
        assert_eq!(value["order_id"], "0x01");
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = OmeClient::connect("not a url").await;
        assert!(matches!(result, Err(SdkError::Connection(_))));
    }
}
