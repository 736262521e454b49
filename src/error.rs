//! Error taxonomy shared by the ledger, settlement and HTTP layers.
//!
//! Validation errors are client faults; infrastructure errors are server
//! faults. A confirmation timeout is deliberately absent: it is reported as
//! [`crate::settlement::Settlement::Pending`], never as an error.

use alloy::primitives::{TxHash, U256};
use thiserror::Error;

use crate::units::format_eth;

/// Errors produced while crediting, redeeming or transferring.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreasuryError {
    /// Address string is not a `0x`-prefixed 40 hex digit account.
    #[error("Invalid address: {0}")]
    InvalidIdentity(String),

    /// Transaction hash is not 32 bytes of hex.
    #[error("Invalid transaction hash: {0}")]
    InvalidTxHash(String),

    /// Amount is zero, negative, non-finite or finer than one wei.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Requested more than the identity's available credits.
    #[error("Need {}, have {}", format_eth(*requested), format_eth(*available))]
    InsufficientCredits { requested: U256, available: U256 },

    /// Treasury cannot cover the transfer plus the fee reserve.
    #[error("Treasury low: {} available, {} required", format_eth(*balance), format_eth(*required))]
    TreasuryIlliquid { balance: U256, required: U256 },

    /// Credential missing/malformed or the signer rejected the transaction.
    #[error("Signing failed: {0}")]
    SigningFailure(String),

    /// The node refused or never received the raw transaction.
    #[error("Broadcast failed: {0}")]
    BroadcastFailure(String),

    /// No usable connection to the chain (startup or query time).
    #[error("Chain unreachable: {0}")]
    ChainUnreachable(String),

    /// Mined with a failure status; the fee was spent, the ledger untouched.
    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },
}

impl TreasuryError {
    /// Whether the caller, not the service, is at fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentity(_)
                | Self::InvalidTxHash(_)
                | Self::InvalidAmount(_)
                | Self::InsufficientCredits { .. }
                | Self::TreasuryIlliquid { .. }
        )
    }

    /// Stable machine-readable code used in API responses and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentity(_) => "invalid_identity",
            Self::InvalidTxHash(_) => "invalid_tx_hash",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InsufficientCredits { .. } => "insufficient_credits",
            Self::TreasuryIlliquid { .. } => "treasury_illiquid",
            Self::SigningFailure(_) => "signing_failure",
            Self::BroadcastFailure(_) => "broadcast_failure",
            Self::ChainUnreachable(_) => "chain_unreachable",
            Self::Reverted { .. } => "reverted",
        }
    }
}

/// Result type for treasury operations.
pub type TreasuryResult<T> = Result<T, TreasuryError>;
