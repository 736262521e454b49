//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::TreasuryConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listener port override.
pub const PORT_ENV_VAR: &str = "PORT";
/// Hosted node API key.
pub const NODE_API_KEY_ENV_VAR: &str = "ALCHEMY_API_KEY";
/// ETH → USD display price.
pub const ETH_PRICE_ENV_VAR: &str = "TREASURY_ETH_PRICE_USD";
/// Bearer token for administrative routes.
pub const ADMIN_KEY_ENV_VAR: &str = "TREASURY_ADMIN_API_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {name}: {value}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<TreasuryConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => TreasuryConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut TreasuryConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(PORT_ENV_VAR) {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            name: PORT_ENV_VAR,
            value: port.clone(),
        })?;
        config.listener.set_port(port);
    }

    if let Some(key) = lookup(NODE_API_KEY_ENV_VAR).filter(|k| !k.trim().is_empty()) {
        config.chain.node_api_key = Some(key.trim().to_string());
    }

    if let Some(price) = lookup(ETH_PRICE_ENV_VAR) {
        config.pricing.eth_price_usd = price.trim().parse().map_err(|_| ConfigError::Env {
            name: ETH_PRICE_ENV_VAR,
            value: price.clone(),
        })?;
    }

    if let Some(key) = lookup(ADMIN_KEY_ENV_VAR).filter(|k| !k.trim().is_empty()) {
        config.admin.api_key = Some(key.trim().to_string());
    }

    Ok(())
}
