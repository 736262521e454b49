//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and cross-field
//! constraints, returning every problem rather than the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::TreasuryConfig;

/// Shortest accepted admin bearer token.
pub const MIN_ADMIN_KEY_LEN: usize = 16;

/// A single semantic configuration problem.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration.
pub fn validate_config(config: &TreasuryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let chain = &config.chain;
    if url::Url::parse(&chain.resolved_rpc_url()).is_err() {
        errors.push(ValidationError::new("chain.rpc_url", "not a valid URL"));
    }
    for failover in &chain.failover_urls {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                "chain.failover_urls",
                format!("'{failover}' is not a valid URL"),
            ));
        }
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be > 0"));
    }
    if !chain.gas_price_multiplier.is_finite() || chain.gas_price_multiplier < 1.0 {
        errors.push(ValidationError::new("chain.gas_price_multiplier", "must be >= 1.0"));
    }
    if !chain.min_reserve_eth.is_finite() || chain.min_reserve_eth < 0.0 {
        errors.push(ValidationError::new("chain.min_reserve_eth", "must be >= 0"));
    }
    if chain.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.confirmation_timeout_secs", "must be > 0"));
    }
    if chain.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new("chain.receipt_poll_interval_ms", "must be > 0"));
    }

    if config.timeouts.request_secs <= chain.confirmation_timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must exceed chain.confirmation_timeout_secs",
        ));
    }

    if !config.pricing.eth_price_usd.is_finite() || config.pricing.eth_price_usd < 0.0 {
        errors.push(ValidationError::new("pricing.eth_price_usd", "must be >= 0"));
    }

    if let Some(key) = &config.admin.api_key {
        if key.len() < MIN_ADMIN_KEY_LEN {
            errors.push(ValidationError::new(
                "admin.api_key",
                format!("must be at least {MIN_ADMIN_KEY_LEN} characters"),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&TreasuryConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = TreasuryConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.chain.gas_price_multiplier = 0.5;
        config.timeouts.request_secs = 60;
        config.admin.api_key = Some("short".to_string());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "chain.gas_price_multiplier",
                "timeouts.request_secs",
                "admin.api_key",
            ]
        );
    }
}
