//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file; every
//! section has defaults so an empty file (or no file) is a valid config.
//! The treasury private key is deliberately not part of the schema.

use serde::{Deserialize, Serialize};

/// Root configuration for the treasury service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TreasuryConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Chain connectivity and settlement parameters.
    pub chain: ChainConfig,

    /// Display price conversion.
    pub pricing: PricingConfig,

    /// Administrative transfer access.
    pub admin: AdminConfig,

    /// HTTP timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_size: 64 * 1024,
        }
    }
}

impl ListenerConfig {
    /// Replace the port of the bind address, keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.bind_address = format!("{host}:{port}");
    }
}

/// Chain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL used when no node API key is configured.
    pub rpc_url: String,

    /// Hosted node API key; when set, the hosted endpoint replaces `rpc_url`.
    pub node_api_key: Option<String>,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID transfers are signed for (1 = Ethereum mainnet).
    pub chain_id: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Multiplier applied to the network gas price (1.1 = 10% markup).
    pub gas_price_multiplier: f64,

    /// Treasury balance kept above every transfer to cover its fee, in ETH.
    pub min_reserve_eth: f64,

    /// Wall-clock limit for receipt polling in seconds.
    pub confirmation_timeout_secs: u64,

    /// Delay between receipt polls in milliseconds.
    pub receipt_poll_interval_ms: u64,

    /// Block explorer base URL for transaction links.
    pub explorer_tx_url: String,

    /// Human-readable network name for status responses.
    pub network_name: String,
}

/// Hosted endpoint used when a node API key is configured.
pub const HOSTED_RPC_PREFIX: &str = "https://eth-mainnet.g.alchemy.com/v2/";

/// Shortest string treated as a real node API key.
const MIN_NODE_API_KEY_LEN: usize = 11;

impl ChainConfig {
    /// The primary RPC URL: hosted endpoint when a key is present, else `rpc_url`.
    pub fn resolved_rpc_url(&self) -> String {
        match self.node_api_key.as_deref() {
            Some(key) if key.len() >= MIN_NODE_API_KEY_LEN => format!("{HOSTED_RPC_PREFIX}{key}"),
            _ => self.rpc_url.clone(),
        }
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_link(&self, tx_hash: &str) -> String {
        format!("{}{}", self.explorer_tx_url, tx_hash)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://eth-mainnet.public.blastapi.io".to_string(),
            node_api_key: None,
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 60,
            gas_price_multiplier: 1.1,
            min_reserve_eth: 0.002,
            confirmation_timeout_secs: 120,
            receipt_poll_interval_ms: 2000,
            explorer_tx_url: "https://etherscan.io/tx/".to_string(),
            network_name: "Ethereum Mainnet".to_string(),
        }
    }
}

/// Price conversion for USD display fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Fixed ETH price in USD.
    pub eth_price_usd: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { eth_price_usd: 3450.0 }
    }
}

/// Administrative access configuration.
///
/// With no API key the administrative transfer endpoint refuses every call.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required on administrative routes.
    pub api_key: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds; must outlast confirmation polling.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 180 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
