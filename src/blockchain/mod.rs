//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (TREASURY_PRIVATE_KEY, ALCHEMY_API_KEY)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts + failover)
//!     → transaction.rs (transfer params, receipt polling)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys, node API keys or raw signed bytes
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the chain is unreachable

pub mod client;
pub mod gateway;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use gateway::ChainGateway;
pub use transaction::{TransferParams, TRANSFER_GAS_LIMIT};
pub use types::{BlockchainError, BlockchainResult, Receipt};
pub use wallet::{SignedTransfer, TreasurySigner};
