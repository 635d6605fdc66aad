//! Daemon configuration from `OME_*` environment variables

use alloy_primitives::Address;
use ome_core::application::forwarder::constants::{
    DEFAULT_FORWARD_BASE_DELAY_MS, DEFAULT_FORWARD_MAX_ATTEMPTS, DEFAULT_FORWARD_QUEUE_CAPACITY,
};
use ome_core::domain::external::parse_address;
use ome_core::error::{AppError, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub rpc_host: String,
    pub rpc_port: u16,
    pub executioner_url: String,
    pub executioner_timeout: Duration,
    pub validate_orders: bool,
    pub auto_create_markets: bool,
    /// Markets created at startup
    pub markets: Vec<Address>,
    pub forward_queue: usize,
    pub forward_max_attempts: u32,
    pub forward_base_delay_ms: u64,
    pub prune_interval: Duration,
    pub rate_limit_burst: u32,
    pub rate_limit_rate: u32,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        Ok(Self {
            rpc_host: env.string("OME_RPC_HOST", "127.0.0.1"),
            rpc_port: env.parsed("OME_RPC_PORT", 8989)?,
            executioner_url: env.string("OME_EXECUTIONER_URL", "http://127.0.0.1:3000"),
            executioner_timeout: Duration::from_secs(
                env.parsed("OME_EXECUTIONER_TIMEOUT_SECS", 10)?,
            ),
            validate_orders: env.flag("OME_VALIDATE_ORDERS", false)?,
            auto_create_markets: env.flag("OME_AUTO_CREATE_MARKETS", true)?,
            markets: env.markets("OME_MARKETS")?,
            forward_queue: env.parsed("OME_FORWARD_QUEUE", DEFAULT_FORWARD_QUEUE_CAPACITY)?,
            forward_max_attempts: env
                .parsed("OME_FORWARD_MAX_ATTEMPTS", DEFAULT_FORWARD_MAX_ATTEMPTS)?,
            forward_base_delay_ms: env
                .parsed("OME_FORWARD_BASE_DELAY_MS", DEFAULT_FORWARD_BASE_DELAY_MS)?,
            prune_interval: Duration::from_secs(env.parsed("OME_PRUNE_INTERVAL_SECS", 30)?),
            rate_limit_burst: env.parsed("OME_RATE_LIMIT_BURST", 200)?,
            rate_limit_rate: env.parsed("OME_RATE_LIMIT_RATE", 100)?,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("{}={:?} is not valid", key, raw))),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(AppError::Config(format!("{}={:?} is not a boolean", key, v))),
            },
        }
    }

    fn markets(&self, key: &str) -> Result<Vec<Address>> {
        let Some(raw) = self.get(key) else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                parse_address(s)
                    .map_err(|e| AppError::Config(format!("{}: {}", key, e)))
            })
            .collect()
    }
}
