//! Shared utilities for integration tests.

#![allow(dead_code)]

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use credit_treasury::blockchain::{
    BlockchainError, BlockchainResult, ChainGateway, Receipt, TreasurySigner, TRANSFER_GAS_LIMIT,
};
use credit_treasury::config::TreasuryConfig;
use credit_treasury::http::HttpServer;
use credit_treasury::ledger::LedgerStore;
use credit_treasury::lifecycle::{Shutdown, TreasuryMode};
use credit_treasury::settlement::{SettlementEngine, SettlementSettings};

/// Anvil's first development key.
pub const TREASURY_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Anvil's second development account.
pub const USER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
pub const USER_CHECKSUMMED: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const ADMIN_KEY: &str = "integration-admin-key-0001";
pub const BLOCK_NUMBER: u64 = 19_000_000;

#[derive(Clone, Copy, PartialEq)]
pub enum ReceiptMode {
    Success,
    Revert,
    Never,
}

/// In-memory node: fixed balance and gas price, records every broadcast
/// and answers receipts according to `mode`.
pub struct ScriptedChain {
    pub balance: U256,
    pub mode: ReceiptMode,
    sent: Mutex<Vec<TxEnvelope>>,
    mined: Mutex<HashMap<TxHash, bool>>,
}

impl ScriptedChain {
    pub fn new(balance: U256, mode: ReceiptMode) -> Self {
        Self {
            balance,
            mode,
            sent: Mutex::new(Vec::new()),
            mined: Mutex::new(HashMap::new()),
        }
    }

    pub fn sent(&self) -> Vec<TxEnvelope> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainGateway for ScriptedChain {
    async fn balance(&self, _: Address) -> BlockchainResult<U256> {
        Ok(self.balance)
    }

    async fn transaction_count(&self, _: Address) -> BlockchainResult<u64> {
        Ok(self.sent.lock().unwrap().len() as u64)
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        Ok(10_000_000_000)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| BlockchainError::Broadcast(e.to_string()))?;
        let hash = *envelope.tx_hash();
        self.sent.lock().unwrap().push(envelope);
        match self.mode {
            ReceiptMode::Success => self.mined.lock().unwrap().insert(hash, true),
            ReceiptMode::Revert => self.mined.lock().unwrap().insert(hash, false),
            ReceiptMode::Never => None,
        };
        Ok(hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>> {
        Ok(self.mined.lock().unwrap().get(&tx_hash).map(|success| Receipt {
            tx_hash,
            success: *success,
            block_number: BLOCK_NUMBER,
            gas_used: TRANSFER_GAS_LIMIT,
            effective_gas_price: 11_000_000_000,
        }))
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

pub fn eth(milli: u64) -> U256 {
    U256::from(milli) * U256::from(1_000_000_000_000_000u64)
}

pub fn test_config() -> TreasuryConfig {
    let mut config = TreasuryConfig::default();
    config.admin.api_key = Some(ADMIN_KEY.to_string());
    config
}

pub fn connected(chain: Arc<ScriptedChain>, ledger: Arc<LedgerStore>) -> TreasuryMode {
    let signer = TreasurySigner::from_private_key(TREASURY_KEY).unwrap();
    let settings = SettlementSettings {
        chain_id: 1,
        gas_price_multiplier: 1.1,
        min_reserve: eth(2),
        confirmation_timeout: Duration::from_millis(300),
        poll_interval: Duration::from_millis(10),
    };
    TreasuryMode::Connected(Arc::new(SettlementEngine::new(chain, signer, ledger, settings)))
}

/// A running server plus the handles tests poke at.
pub struct TestServer {
    pub base_url: String,
    pub ledger: Arc<LedgerStore>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

/// Serve on an ephemeral port with the mode produced by `mode`.
pub async fn spawn_server<F>(config: TreasuryConfig, mode: F) -> TestServer
where
    F: FnOnce(Arc<LedgerStore>) -> TreasuryMode,
{
    let ledger = Arc::new(LedgerStore::new());
    let treasury = mode(Arc::clone(&ledger));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::clone(&ledger), treasury);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        base_url: format!("http://{addr}"),
        ledger,
        shutdown,
        handle,
    }
}

/// Server backed by a scripted chain.
pub async fn spawn_connected(chain: Arc<ScriptedChain>) -> TestServer {
    spawn_server(test_config(), move |ledger| connected(chain, ledger)).await
}

/// Server without chain access.
pub async fn spawn_ledger_only() -> TestServer {
    spawn_server(test_config(), |_| TreasuryMode::LedgerOnly {
        reason: "treasury signer unavailable".to_string(),
        treasury_address: None,
    })
    .await
}
