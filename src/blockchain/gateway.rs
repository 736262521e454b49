//! The node contract settlement depends on.
//!
//! [`crate::blockchain::BlockchainClient`] implements it over JSON-RPC;
//! tests substitute scripted implementations.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, Receipt};

/// Remote blockchain node operations.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Native balance of `address` in wei, counting pending transactions.
    async fn balance(&self, address: Address) -> BlockchainResult<U256>;

    /// Next usable nonce for `address`, counting pending transactions.
    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// Current network gas price, in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// Submit signed transaction bytes; returns the hash the node reports.
    ///
    /// Errors for which [`crate::blockchain::BlockchainError::may_have_landed`]
    /// holds leave the transaction's fate open.
    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;

    /// Receipt for `tx_hash`, or `None` while it is unmined.
    async fn receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>>;

    /// Whether the node currently answers queries.
    async fn is_healthy(&self) -> bool;
}
