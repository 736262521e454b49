//! Startup orchestration and chain capability selection.
//!
//! The service always starts. Without a usable signer or a reachable,
//! correctly configured node it runs in ledger-only mode: credits and
//! lookups work, redemptions and transfers answer `ChainUnreachable`.

use alloy::primitives::Address;
use std::sync::Arc;

use crate::blockchain::{BlockchainClient, BlockchainResult, ChainGateway, TreasurySigner};
use crate::config::TreasuryConfig;
use crate::error::{TreasuryError, TreasuryResult};
use crate::ledger::LedgerStore;
use crate::settlement::{SettlementEngine, SettlementSettings};
use crate::units::format_eth;

/// What the service can do with the chain, fixed at startup.
#[derive(Debug, Clone)]
pub enum TreasuryMode {
    /// Signer loaded and node reachable.
    Connected(Arc<SettlementEngine>),
    /// Ledger operations only.
    LedgerOnly {
        reason: String,
        /// Known when the signer loaded but the node did not answer.
        treasury_address: Option<Address>,
    },
}

impl TreasuryMode {
    /// The settlement engine, or `ChainUnreachable` in ledger-only mode.
    pub fn engine(&self) -> TreasuryResult<&Arc<SettlementEngine>> {
        match self {
            Self::Connected(engine) => Ok(engine),
            Self::LedgerOnly { reason, .. } => Err(TreasuryError::ChainUnreachable(reason.clone())),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::LedgerOnly { .. } => "ledger_only",
        }
    }

    pub fn treasury_address(&self) -> Option<Address> {
        match self {
            Self::Connected(engine) => Some(engine.treasury_address()),
            Self::LedgerOnly { treasury_address, .. } => *treasury_address,
        }
    }
}

/// Select the treasury mode using the signer from `TREASURY_PRIVATE_KEY`.
pub async fn initialize_treasury(config: &TreasuryConfig, ledger: Arc<LedgerStore>) -> TreasuryMode {
    initialize_with_signer(config, ledger, TreasurySigner::from_env()).await
}

/// Select the treasury mode from an already-attempted signer load.
pub async fn initialize_with_signer(
    config: &TreasuryConfig,
    ledger: Arc<LedgerStore>,
    signer: BlockchainResult<TreasurySigner>,
) -> TreasuryMode {
    let signer = match signer {
        Ok(signer) => signer,
        Err(e) => return ledger_only(format!("treasury signer unavailable: {e}"), None),
    };
    let treasury = signer.address();

    let settings = match SettlementSettings::from_config(&config.chain) {
        Ok(settings) => settings,
        Err(e) => return ledger_only(e.to_string(), Some(treasury)),
    };

    let client = match BlockchainClient::new(config.chain.clone()) {
        Ok(client) => client,
        Err(e) => return ledger_only(e.to_string(), Some(treasury)),
    };

    if let Err(e) = client.verify_chain_id().await {
        return ledger_only(format!("chain check failed: {e}"), Some(treasury));
    }

    match client.balance(treasury).await {
        Ok(balance) => tracing::info!(
            treasury = %treasury,
            balance_eth = %format_eth(balance),
            chain_id = config.chain.chain_id,
            "Connected to chain"
        ),
        Err(e) => return ledger_only(format!("treasury balance query failed: {e}"), Some(treasury)),
    }

    TreasuryMode::Connected(Arc::new(SettlementEngine::new(
        Arc::new(client),
        signer,
        ledger,
        settings,
    )))
}

fn ledger_only(reason: String, treasury_address: Option<Address>) -> TreasuryMode {
    tracing::warn!(reason = %reason, "Starting in ledger-only mode");
    TreasuryMode::LedgerOnly {
        reason,
        treasury_address,
    }
}
