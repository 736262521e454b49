//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (PORT, ALCHEMY_API_KEY, ... env overrides)
//!     → validation.rs (semantic checks)
//!     → TreasuryConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the credential is never rotated
//! - All fields have defaults to allow minimal configs
//! - The treasury private key is read from the environment only, at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ChainConfig, ListenerConfig, ObservabilityConfig, PricingConfig, TimeoutConfig,
    TreasuryConfig,
};
