//! Treasury signing credential.
//!
//! # Security
//! - The private key is loaded ONLY from the environment, once, at startup
//! - Keys are never logged or serialized
//! - `Debug` prints the derived address only

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::transaction::TransferParams;
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable name for the treasury private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "TREASURY_PRIVATE_KEY";

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    /// EIP-2718 encoded transaction bytes.
    pub raw: Bytes,
    /// Hash of the signed transaction.
    pub tx_hash: TxHash,
}

/// Holds the treasury key and signs transfers with it.
#[derive(Clone)]
pub struct TreasurySigner {
    address: Address,
    wallet: EthereumWallet,
}

impl TreasurySigner {
    /// Create a signer from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let trimmed = private_key_hex.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;
        let address = signer.address();

        tracing::info!(address = %address, "Treasury signer initialized");

        Ok(Self {
            address,
            wallet: EthereumWallet::from(signer),
        })
    }

    /// Load the signer from `TREASURY_PRIVATE_KEY`.
    pub fn from_env() -> BlockchainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            BlockchainError::Wallet(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    /// The treasury address derived from the key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a plain value transfer.
    ///
    /// Signatures are RFC 6979 deterministic, so identical parameters always
    /// produce identical bytes.
    pub async fn sign(&self, params: &TransferParams) -> BlockchainResult<SignedTransfer> {
        let envelope = params
            .to_request(self.address)
            .build(&self.wallet)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))?;

        Ok(SignedTransfer {
            tx_hash: *envelope.tx_hash(),
            raw: Bytes::from(envelope.encoded_2718()),
        })
    }
}

impl std::fmt::Debug for TreasurySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreasurySigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
