//! Chain-specific types and error definitions.

use alloy::primitives::{TxHash, U256};
use serde::Serialize;
use thiserror::Error;

use crate::error::TreasuryError;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed on every provider.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node rejected a raw transaction.
    #[error("Broadcast rejected: {0}")]
    Broadcast(String),

    /// No provider confirmed the broadcast, but at least one may have
    /// accepted it (timed out after the bytes were sent).
    #[error("Broadcast unconfirmed: {0}")]
    BroadcastUnconfirmed(String),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl From<BlockchainError> for TreasuryError {
    fn from(err: BlockchainError) -> Self {
        match err {
            BlockchainError::Rpc(msg) => TreasuryError::ChainUnreachable(msg),
            BlockchainError::Broadcast(msg) | BlockchainError::BroadcastUnconfirmed(msg) => {
                TreasuryError::BroadcastFailure(msg)
            }
            BlockchainError::Wallet(msg) => TreasuryError::SigningFailure(msg),
            err @ BlockchainError::ChainMismatch { .. } => {
                TreasuryError::ChainUnreachable(err.to_string())
            }
        }
    }
}

/// Node error fragments meaning the transaction is already in a pool or
/// chain.
const KNOWN_TX_MARKERS: &[&str] = &[
    "already known",
    "known transaction",
    "already imported",
    "alreadyknown",
];

/// Whether a node error message reports the transaction as already known.
pub fn is_known_transaction(message: &str) -> bool {
    let message = message.to_lowercase();
    KNOWN_TX_MARKERS.iter().any(|marker| message.contains(marker))
}

impl BlockchainError {
    /// Whether a failed broadcast may still have reached a mempool.
    ///
    /// Only errors where this is false prove the node never took the
    /// transaction.
    pub fn may_have_landed(&self) -> bool {
        match self {
            Self::BroadcastUnconfirmed(_) => true,
            Self::Broadcast(message) => is_known_transaction(message),
            _ => false,
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// The parts of a transaction receipt settlement cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    /// `true` when execution succeeded.
    pub success: bool,
    pub block_number: u64,
    pub gas_used: u64,
    /// Price actually paid per gas unit, in wei.
    pub effective_gas_price: u128,
}

impl Receipt {
    /// Fee consumed by the transaction, in wei.
    pub fn fee_paid(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_gas_price)
    }
}
