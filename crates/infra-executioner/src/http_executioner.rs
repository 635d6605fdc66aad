// HTTP executioner implementation
// reason: reqwest for JSON over HTTP(S), async-trait for the port (ADR-002)
use alloy_primitives::B256;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use ome_core::domain::{ExternalOrder, Order, TxHash};
use ome_core::port::{Executioner, ExecutionerError};

use crate::tls;

const CHECK_PATH: &str = "check";
const SUBMIT_PATH: &str = "submit";

/// Connection settings for the executioner
#[derive(Debug, Clone)]
pub struct ExecutionerConfig {
    /// Base URL, e.g. `http://127.0.0.1:3000`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ExecutionerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct CheckRequest {
    order: ExternalOrder,
}

#[derive(Serialize)]
struct MatchRequest {
    maker: ExternalOrder,
    taker: ExternalOrder,
}

/// Executioner reached over HTTP
pub struct HttpExecutioner {
    client: Client,
    check_url: String,
    submit_url: String,
}

impl HttpExecutioner {
    /// Create a new HTTP executioner
    ///
    /// # Arguments
    /// * `config` - Base URL and request timeout
    ///
    /// Certificates from `SSL_CERT_FILE` are added to the trust store.
    ///
    /// # Example
    /// ```ignore
    /// let executioner = HttpExecutioner::new(ExecutionerConfig {
    ///     base_url: "https://executioner.example".to_string(),
    ///     timeout: Duration::from_secs(5),
    /// })?;
    /// ```
    pub fn new(config: ExecutionerConfig) -> Result<Self, ExecutionerError> {
        let mut builder = Client::builder().timeout(config.timeout);
        for cert in tls::extra_root_certificates() {
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|e| ExecutionerError::Http(format!("cannot build HTTP client: {}", e)))?;

        let executioner = Self {
            client,
            check_url: endpoint(&config.base_url, CHECK_PATH),
            submit_url: endpoint(&config.base_url, SUBMIT_PATH),
        };

        info!(
            check_url = %executioner.check_url,
            submit_url = %executioner.submit_url,
            timeout_secs = config.timeout.as_secs(),
            "HTTP executioner configured"
        );
        Ok(executioner)
    }

    async fn post<T: Serialize>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<reqwest::Response, ExecutionerError> {
        self.client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ExecutionerError::Http(e.to_string()))
    }
}

#[async_trait]
impl Executioner for HttpExecutioner {
    async fn check_order_validity(&self, order: &Order) -> Result<bool, ExecutionerError> {
        let payload = CheckRequest {
            order: ExternalOrder::from(order),
        };
        let response = self.post(&self.check_url, &payload).await?;
        let status = response.status();

        debug!(order_id = %order.id, status = status.as_u16(), "Order validity checked");
        Ok(is_valid_status(status))
    }

    async fn send_matched_orders(
        &self,
        maker: &Order,
        taker: &Order,
    ) -> Result<TxHash, ExecutionerError> {
        let payload = MatchRequest {
            maker: ExternalOrder::from(maker),
            taker: ExternalOrder::from(taker),
        };
        let response = self.post(&self.submit_url, &payload).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                maker = %maker.id,
                taker = %taker.id,
                status = status.as_u16(),
                "Executioner refused matched pair"
            );
            return Err(ExecutionerError::Rejected(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExecutionerError::Http(e.to_string()))?;
        parse_tx_hash(&body)
    }
}

/// Join a base URL and a path segment with exactly one slash
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

fn is_valid_status(status: StatusCode) -> bool {
    status.is_success()
}

/// Transaction hash from a response body
///
/// Accepts a bare hex string or a JSON string, with or without `0x`.
fn parse_tx_hash(body: &str) -> Result<TxHash, ExecutionerError> {
    let trimmed = body.trim().trim_matches('"');
    B256::from_str(trimmed).map_err(|e| {
        ExecutionerError::InvalidResponse(format!("{:?} is not a tx hash: {}", trimmed, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0x4a1cd1f2b0e7c2c3d8a1e0c8c7b5d1b2a3f4e5d6c7b8a9f0e1d2c3b4a5f60718";

    #[test]
    fn test_endpoint_joins_with_single_slash() {
        assert_eq!(endpoint("http://host:3000", "check"), "http://host:3000/check");
        assert_eq!(endpoint("http://host:3000/", "submit"), "http://host:3000/submit");
        assert_eq!(endpoint("http://host/api//", "check"), "http://host/api/check");
    }

    #[test]
    fn test_parse_plain_hash() {
        let hash = parse_tx_hash(HASH).unwrap();
        assert_eq!(hash, B256::from_str(HASH).unwrap());
    }

    #[test]
    fn test_parse_quoted_hash_with_whitespace() {
        let body = format!("  \"{}\"\n", HASH);
        assert_eq!(parse_tx_hash(&body).unwrap(), B256::from_str(HASH).unwrap());
    }

    #[test]
    fn test_parse_hash_without_prefix() {
        let bare = HASH.trim_start_matches("0x");
        assert_eq!(parse_tx_hash(bare).unwrap(), B256::from_str(HASH).unwrap());
    }

    #[test]
    fn test_parse_rejects_short_hash() {
        let err = parse_tx_hash("0xdeadbeef").unwrap_err();
        assert!(matches!(err, ExecutionerError::InvalidResponse(_)));
    }

    #[test]
    fn test_validity_follows_status() {
        assert!(is_valid_status(StatusCode::OK));
        assert!(is_valid_status(StatusCode::NO_CONTENT));
        assert!(!is_valid_status(StatusCode::BAD_REQUEST));
        assert!(!is_valid_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_unreachable_executioner_is_http_error() {
        use alloy_primitives::{Address, Bytes, U256};
        use chrono::{TimeZone, Utc};
        use ome_core::domain::OrderSide;

        // Port 9 (discard) is closed on test hosts
        let executioner = HttpExecutioner::new(ExecutionerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let order = Order::new(
            Address::with_last_byte(1),
            Address::with_last_byte(2),
            OrderSide::Bid,
            U256::from(10u64),
            U256::from(1u64),
            Utc.timestamp_opt(2_000_000_000, 0).unwrap(),
            Utc.timestamp_opt(1_000_000_000, 0).unwrap(),
            Bytes::new(),
        );

        let err = executioner.check_order_validity(&order).await.unwrap_err();
        assert!(matches!(err, ExecutionerError::Http(_)));
    }
}
