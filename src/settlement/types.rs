//! Settlement state machine and result types.

use alloy::primitives::{TxHash, U256};
use serde::Serialize;
use std::time::Duration;

use crate::identity::Identity;

/// States a single settlement attempt moves through.
///
/// ```text
/// Validating → Building → Signing → Broadcasting → AwaitingConfirmation
///                                                   ├→ Confirmed
///                                                   ├→ Reverted
///                                                   └→ TimedOut
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementState {
    Validating,
    Building,
    Signing,
    Broadcasting,
    AwaitingConfirmation,
    Confirmed,
    Reverted,
    TimedOut,
}

/// Which entry point started the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    /// Ledger-gated user claim.
    Redemption,
    /// Ungated administrative transfer.
    Transfer,
}

impl SettlementKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Redemption => "redemption",
            Self::Transfer => "transfer",
        }
    }
}

/// Result of a transfer confirmed on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementOutcome {
    pub success: bool,
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// Gas used × effective gas price, in wei.
    pub fee_paid: U256,
    /// Amount sent, in wei.
    pub amount: U256,
    pub recipient: Identity,
    /// Recipient's ledger balance after the debit; `None` for transfers
    /// that never touch the ledger.
    pub remaining_credits: Option<U256>,
}

/// A broadcast transfer whose receipt did not arrive before the deadline.
///
/// The transfer may still be mined later. No ledger debit was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSettlement {
    pub tx_hash: TxHash,
    pub amount: U256,
    pub recipient: Identity,
    pub waited: Duration,
}

/// Terminal, non-failed result of a settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Confirmed(SettlementOutcome),
    /// Indeterminate: neither success nor failure.
    Pending(PendingSettlement),
}

impl Settlement {
    pub fn tx_hash(&self) -> TxHash {
        match self {
            Self::Confirmed(outcome) => outcome.tx_hash,
            Self::Pending(pending) => pending.tx_hash,
        }
    }
}

/// On-chain status of a previously broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferStatus {
    /// Unknown to the node's receipts: still pending or dropped.
    Pending,
    Confirmed { block_number: u64, fee_paid: U256 },
    Reverted { block_number: u64, fee_paid: U256 },
}
