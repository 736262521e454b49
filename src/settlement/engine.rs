//! Redemption and transfer settlement.
//!
//! # Responsibilities
//! - Validate requests against the ledger and live treasury liquidity
//! - Build, sign and broadcast one transfer per attempt
//! - Await the receipt and settle the ledger hold exactly once
//!
//! # Ordering
//! Credits are withheld (not spent) before the chain is touched. The hold is
//! committed only after a successful receipt and released on every other
//! terminal state. Liquidity check → build → sign → broadcast runs under a
//! treasury-wide lock, so concurrent attempts never sign the same nonce or
//! spend the same treasury balance; no ledger lock is held while waiting on
//! the chain. A broadcast error releases the hold only when the node
//! provably does not have the transaction.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::transaction::{apply_gas_markup, wait_for_receipt};
use crate::blockchain::{
    ChainGateway, Receipt, SignedTransfer, TransferParams, TreasurySigner, TRANSFER_GAS_LIMIT,
};
use crate::config::ChainConfig;
use crate::error::{TreasuryError, TreasuryResult};
use crate::identity::{normalize, Identity};
use crate::ledger::LedgerStore;
use crate::observability::metrics;
use crate::settlement::types::{
    PendingSettlement, Settlement, SettlementKind, SettlementOutcome, SettlementState,
    TransferStatus,
};

/// Fixed parameters of every settlement.
#[derive(Debug, Clone)]
pub struct SettlementSettings {
    pub chain_id: u64,
    pub gas_price_multiplier: f64,
    /// Treasury balance that must remain above the transfer amount, in wei.
    pub min_reserve: U256,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl SettlementSettings {
    pub fn from_config(config: &ChainConfig) -> TreasuryResult<Self> {
        let min_reserve = parse_ether(&config.min_reserve_eth.to_string()).map_err(|e| {
            TreasuryError::InvalidAmount(format!("min_reserve_eth {}: {}", config.min_reserve_eth, e))
        })?;

        Ok(Self {
            chain_id: config.chain_id,
            gas_price_multiplier: config.gas_price_multiplier,
            min_reserve,
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
        })
    }
}

/// How the chain side of an attempt ended, before ledger reconciliation.
enum Execution {
    Confirmed(Receipt),
    TimedOut { tx_hash: TxHash, waited: Duration },
}

/// Drives redemptions and administrative transfers to a terminal state.
pub struct SettlementEngine {
    gateway: Arc<dyn ChainGateway>,
    signer: TreasurySigner,
    ledger: Arc<LedgerStore>,
    settings: SettlementSettings,
    /// Serializes nonce lookup through broadcast.
    submit_lock: Mutex<()>,
}

impl SettlementEngine {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        signer: TreasurySigner,
        ledger: Arc<LedgerStore>,
        settings: SettlementSettings,
    ) -> Self {
        Self {
            gateway,
            signer,
            ledger,
            settings,
            submit_lock: Mutex::new(()),
        }
    }

    /// Treasury account address.
    pub fn treasury_address(&self) -> Address {
        self.signer.address()
    }

    /// Live treasury balance in wei.
    pub async fn treasury_balance(&self) -> TreasuryResult<U256> {
        Ok(self.gateway.balance(self.signer.address()).await?)
    }

    /// Whether the node currently answers.
    pub async fn is_healthy(&self) -> bool {
        self.gateway.is_healthy().await
    }

    /// Redeem `amount` wei of the identity's credits as an on-chain transfer
    /// to that identity.
    ///
    /// The attempt runs on its own task: if the caller stops waiting, the
    /// transfer and the ledger reconciliation still complete.
    pub async fn redeem(self: &Arc<Self>, raw_identity: &str, amount: U256) -> TreasuryResult<Settlement> {
        let engine = Arc::clone(self);
        let raw_identity = raw_identity.to_string();
        detach(async move { engine.run_redemption(&raw_identity, amount).await }).await
    }

    /// Send `amount` wei from the treasury to any address, bypassing the
    /// ledger. Callers must be authorized before reaching this.
    pub async fn transfer(self: &Arc<Self>, raw_recipient: &str, amount: U256) -> TreasuryResult<Settlement> {
        let engine = Arc::clone(self);
        let raw_recipient = raw_recipient.to_string();
        detach(async move { engine.run_transfer(&raw_recipient, amount).await }).await
    }

    /// Look up the fate of a previously broadcast transaction.
    pub async fn status(&self, tx_hash: TxHash) -> TreasuryResult<TransferStatus> {
        let status = match self.gateway.receipt(tx_hash).await? {
            None => TransferStatus::Pending,
            Some(receipt) if receipt.success => TransferStatus::Confirmed {
                block_number: receipt.block_number,
                fee_paid: receipt.fee_paid(),
            },
            Some(receipt) => TransferStatus::Reverted {
                block_number: receipt.block_number,
                fee_paid: receipt.fee_paid(),
            },
        };
        Ok(status)
    }

    async fn run_redemption(&self, raw_identity: &str, amount: U256) -> TreasuryResult<Settlement> {
        let kind = SettlementKind::Redemption;
        let span = tracing::info_span!("settlement", attempt = %Uuid::new_v4(), kind = kind.label());

        async {
            log_state(SettlementState::Validating);
            let identity = normalize(raw_identity)?;
            require_positive(amount)?;

            // Check and withhold in one step; see module docs.
            let hold = self.ledger.reserve(identity, amount)?;

            let settlement = match self.execute(identity, amount).await {
                Ok(Execution::Confirmed(receipt)) => {
                    let remaining = hold.commit();
                    Settlement::Confirmed(outcome(identity, amount, &receipt, Some(remaining)))
                }
                Ok(Execution::TimedOut { tx_hash, waited }) => {
                    hold.release();
                    Settlement::Pending(PendingSettlement {
                        tx_hash,
                        amount,
                        recipient: identity,
                        waited,
                    })
                }
                Err(e) => {
                    hold.release();
                    return Err(e);
                }
            };
            Ok::<_, TreasuryError>(settlement)
        }
        .instrument(span)
        .await
        .inspect(|s| record_success(kind, s))
        .inspect_err(|e| record_failure(kind, e))
    }

    async fn run_transfer(&self, raw_recipient: &str, amount: U256) -> TreasuryResult<Settlement> {
        let kind = SettlementKind::Transfer;
        let span = tracing::info_span!("settlement", attempt = %Uuid::new_v4(), kind = kind.label());

        async {
            log_state(SettlementState::Validating);
            let recipient = normalize(raw_recipient)?;
            require_positive(amount)?;

            let settlement = match self.execute(recipient, amount).await? {
                Execution::Confirmed(receipt) => {
                    Settlement::Confirmed(outcome(recipient, amount, &receipt, None))
                }
                Execution::TimedOut { tx_hash, waited } => Settlement::Pending(PendingSettlement {
                    tx_hash,
                    amount,
                    recipient,
                    waited,
                }),
            };
            Ok::<_, TreasuryError>(settlement)
        }
        .instrument(span)
        .await
        .inspect(|s| record_success(kind, s))
        .inspect_err(|e| record_failure(kind, e))
    }

    /// Liquidity check through confirmation. Never touches the ledger.
    async fn execute(&self, recipient: Identity, amount: U256) -> TreasuryResult<Execution> {
        let treasury = self.signer.address();

        let tx_hash = {
            let _guard = self.submit_lock.lock().await;

            let balance = self.gateway.balance(treasury).await?;
            self.check_liquidity(balance, amount)?;

            log_state(SettlementState::Building);
            let nonce = self.gateway.transaction_count(treasury).await?;
            let network_gas_price = self.gateway.gas_price().await?;
            let params = TransferParams {
                to: recipient.address(),
                value: amount,
                gas_limit: TRANSFER_GAS_LIMIT,
                gas_price: apply_gas_markup(network_gas_price, self.settings.gas_price_multiplier),
                nonce,
                chain_id: self.settings.chain_id,
            };

            log_state(SettlementState::Signing);
            let signed = self.signer.sign(&params).await?;

            log_state(SettlementState::Broadcasting);
            let reported = self.broadcast(&signed).await?;

            tracing::info!(
                tx_hash = %reported,
                recipient = %recipient,
                amount = %amount,
                nonce = params.nonce,
                gas_price = params.gas_price,
                max_fee = %params.max_fee(),
                "Transaction sent"
            );
            reported
        };

        log_state(SettlementState::AwaitingConfirmation);
        let started = Instant::now();
        let receipt = wait_for_receipt(
            self.gateway.as_ref(),
            tx_hash,
            self.settings.confirmation_timeout,
            self.settings.poll_interval,
        )
        .await;
        let waited = started.elapsed();

        match receipt {
            Some(receipt) if receipt.success => {
                metrics::record_confirmation_latency(waited);
                log_state(SettlementState::Confirmed);
                tracing::info!(tx_hash = %tx_hash, block = receipt.block_number, "Confirmed");
                Ok(Execution::Confirmed(receipt))
            }
            Some(receipt) => {
                metrics::record_confirmation_latency(waited);
                log_state(SettlementState::Reverted);
                tracing::error!(
                    tx_hash = %tx_hash,
                    block = receipt.block_number,
                    fee_paid = %receipt.fee_paid(),
                    "Transaction reverted; fee spent from treasury"
                );
                Err(TreasuryError::Reverted { tx_hash })
            }
            None => {
                log_state(SettlementState::TimedOut);
                tracing::warn!(tx_hash = %tx_hash, waited = ?waited, "No receipt before deadline");
                Ok(Execution::TimedOut { tx_hash, waited })
            }
        }
    }

    /// Submit the signed transfer and return the hash to await.
    ///
    /// A failed broadcast only fails the attempt when the node provably does
    /// not have the transaction. Timeouts and "already known" answers fall
    /// back to the locally computed hash, and a plain rejection is checked
    /// against the chain before the caller releases any credits.
    async fn broadcast(&self, signed: &SignedTransfer) -> TreasuryResult<TxHash> {
        let err = match self.gateway.send_raw_transaction(&signed.raw).await {
            Ok(reported) => {
                if reported != signed.tx_hash {
                    tracing::warn!(local = %signed.tx_hash, reported = %reported, "Node reported a different transaction hash");
                }
                return Ok(reported);
            }
            Err(e) => e,
        };

        if err.may_have_landed() {
            tracing::warn!(tx_hash = %signed.tx_hash, error = %err, "Broadcast outcome unknown; awaiting receipt");
            return Ok(signed.tx_hash);
        }

        match self.gateway.receipt(signed.tx_hash).await {
            Ok(Some(_)) => {
                tracing::warn!(tx_hash = %signed.tx_hash, error = %err, "Rejected broadcast is already mined");
                Ok(signed.tx_hash)
            }
            Ok(None) => Err(err.into()),
            Err(lookup) => {
                tracing::warn!(tx_hash = %signed.tx_hash, error = %lookup, "Receipt check after rejected broadcast failed");
                Err(err.into())
            }
        }
    }

    /// Treasury must hold at least `amount + min_reserve`.
    fn check_liquidity(&self, balance: U256, amount: U256) -> TreasuryResult<()> {
        let required = amount.saturating_add(self.settings.min_reserve);
        if balance < required {
            return Err(TreasuryError::TreasuryIlliquid { balance, required });
        }
        Ok(())
    }
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("treasury", &self.signer.address())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Run a settlement on its own task and wait for it.
async fn detach<F>(attempt: F) -> TreasuryResult<Settlement>
where
    F: std::future::Future<Output = TreasuryResult<Settlement>> + Send + 'static,
{
    match tokio::spawn(attempt).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(TreasuryError::ChainUnreachable(format!("settlement task cancelled: {e}"))),
    }
}

fn require_positive(amount: U256) -> TreasuryResult<()> {
    if amount.is_zero() {
        return Err(TreasuryError::InvalidAmount("Amount must be positive".into()));
    }
    Ok(())
}

fn outcome(
    recipient: Identity,
    amount: U256,
    receipt: &Receipt,
    remaining_credits: Option<U256>,
) -> SettlementOutcome {
    SettlementOutcome {
        success: true,
        tx_hash: receipt.tx_hash,
        block_number: receipt.block_number,
        fee_paid: receipt.fee_paid(),
        amount,
        recipient,
        remaining_credits,
    }
}

fn log_state(state: SettlementState) {
    tracing::debug!(state = ?state, "Settlement state");
}

fn record_success(kind: SettlementKind, settlement: &Settlement) {
    let outcome = match settlement {
        Settlement::Confirmed(_) => "confirmed",
        Settlement::Pending(_) => "timed_out",
    };
    metrics::record_settlement(kind.label(), outcome);
}

fn record_failure(kind: SettlementKind, err: &TreasuryError) {
    tracing::warn!(kind = kind.label(), error = %err, "Settlement failed");
    metrics::record_settlement(kind.label(), err.code());
}
