//! Transfer construction and confirmation monitoring.
//!
//! # Responsibilities
//! - Describe a plain value transfer as concrete transaction parameters
//! - Apply the gas price markup
//! - Poll for a receipt until a wall-clock deadline

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::gateway::ChainGateway;
use crate::blockchain::types::Receipt;

/// Gas consumed by a plain value transfer with no calldata.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Everything needed to sign a native-currency transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub to: Address,
    /// Amount in wei.
    pub value: U256,
    pub gas_limit: u64,
    /// Gas price in wei, markup already applied.
    pub gas_price: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

impl TransferParams {
    /// Build a legacy-priced transaction request sent from `from`.
    pub fn to_request(&self, from: Address) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(from)
            .with_to(self.to)
            .with_value(self.value)
            .with_nonce(self.nonce)
            .with_gas_price(self.gas_price)
            .with_gas_limit(self.gas_limit)
            .with_chain_id(self.chain_id)
    }

    /// Worst-case fee: gas limit × gas price, in wei.
    pub fn max_fee(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.gas_price)
    }
}

/// Scale the network gas price by `multiplier`, truncating to whole wei.
pub fn apply_gas_markup(gas_price: u128, multiplier: f64) -> u128 {
    (gas_price as f64 * multiplier) as u128
}

/// Poll for a receipt until one appears or `deadline` elapses.
///
/// Returns `None` on timeout. RPC errors while polling are logged and
/// polled through: the transaction is already broadcast, so a flaky node
/// must not be mistaken for a failed transfer.
pub async fn wait_for_receipt(
    gateway: &dyn ChainGateway,
    tx_hash: TxHash,
    deadline: Duration,
    poll_interval: Duration,
) -> Option<Receipt> {
    let result = timeout(deadline, async {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match gateway.receipt(tx_hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
                Err(e) => tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed"),
            }
        }
    })
    .await;

    result.ok()
}
