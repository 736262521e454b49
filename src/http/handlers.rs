//! Public API handlers.

use alloy::primitives::{TxHash, U256};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{TreasuryError, TreasuryResult};
use crate::http::server::AppState;
use crate::identity::{self, Identity};
use crate::lifecycle::TreasuryMode;
use crate::settlement::{PendingSettlement, Settlement, SettlementOutcome, TransferStatus};
use crate::units::{parse_eth_amount, wei_to_eth, wei_to_usd};

/// Wallet value sent by clients that have not connected a wallet yet.
const NOT_CONNECTED: &str = "not_connected";

#[derive(Debug, Deserialize)]
pub struct ReceiveEarningsRequest {
    #[serde(rename = "amountETH")]
    pub amount_eth: f64,
    #[serde(rename = "amountUSD", default)]
    pub amount_usd: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "userWallet", default)]
    pub user_wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimEarningsRequest {
    #[serde(rename = "userWallet")]
    pub user_wallet: String,
    #[serde(rename = "amountETH")]
    pub amount_eth: f64,
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub wallet: Identity,
    pub credits_eth: f64,
    pub credits_usd: f64,
    pub can_claim: bool,
}

pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Treasury balance when the chain is available.
async fn treasury_balance(state: &AppState) -> Option<U256> {
    let engine = state.treasury.engine().ok()?;
    match engine.treasury_balance().await {
        Ok(balance) => Some(balance),
        Err(e) => {
            tracing::warn!(error = %e, "Treasury balance query failed");
            None
        }
    }
}

/// `GET /` service snapshot.
pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let price = state.config.pricing.eth_price_usd;
    let balance = treasury_balance(&state).await;
    let reason = match state.treasury.as_ref() {
        TreasuryMode::LedgerOnly { reason, .. } => Some(reason.clone()),
        TreasuryMode::Connected(_) => None,
    };

    Json(json!({
        "service": "Credit Treasury API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "online",
        "chain_mode": state.treasury.label(),
        "chain_ready": state.treasury.is_connected(),
        "ledger_only_reason": reason,
        "treasury_address": state.treasury.treasury_address().map(|a| a.to_checksum(None)),
        "treasury_eth_balance": balance.map(wei_to_eth),
        "treasury_usd_balance": balance.map(|b| wei_to_usd(b, price)),
        "network": state.config.chain.network_name,
        "chain_id": state.config.chain.chain_id,
        "timestamp": unix_timestamp(),
    }))
}

/// `GET /health` liveness plus ledger totals.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let balance = treasury_balance(&state).await;
    let chain_ready = match state.treasury.engine() {
        Ok(engine) => engine.is_healthy().await,
        Err(_) => false,
    };

    Json(json!({
        "status": "healthy",
        "chain_ready": chain_ready,
        "treasury_balance_eth": balance.map(wei_to_eth),
        "total_users": state.ledger.identity_count(),
        "total_credits_eth": wei_to_eth(state.ledger.total_credits()),
    }))
}

/// `POST /api/treasury/receive` records earned credits.
///
/// Without a connected wallet the earning is acknowledged but credited to
/// nobody.
pub async fn receive_earnings(
    State(state): State<AppState>,
    Json(request): Json<ReceiveEarningsRequest>,
) -> TreasuryResult<Json<serde_json::Value>> {
    let amount = parse_eth_amount(request.amount_eth)?;

    let wallet = request
        .user_wallet
        .as_deref()
        .filter(|w| !w.is_empty() && *w != NOT_CONNECTED);

    let credited = match wallet {
        Some(raw) => {
            let identity = identity::normalize(raw)?;
            let balance = state.ledger.credit(identity, amount)?;
            tracing::info!(
                identity = %identity,
                amount_eth = wei_to_eth(amount),
                source = request.source.as_deref().unwrap_or("unknown"),
                "Earnings received"
            );
            Some((identity, balance))
        }
        None => {
            tracing::info!(
                amount_eth = wei_to_eth(amount),
                source = request.source.as_deref().unwrap_or("unknown"),
                "Earnings received without wallet"
            );
            None
        }
    };

    let price = state.config.pricing.eth_price_usd;
    let amount_usd = request.amount_usd.unwrap_or_else(|| wei_to_usd(amount, price));
    let treasury = treasury_balance(&state).await;

    Ok(Json(json!({
        "success": true,
        "amountETH": wei_to_eth(amount),
        "amountUSD": amount_usd,
        "userWallet": credited.map(|(identity, _)| identity),
        "user_total_credits": credited.map(|(_, balance)| wei_to_eth(balance)),
        "treasury_eth_balance": treasury.map(wei_to_eth),
        "treasury_usd_balance": treasury.map(|b| wei_to_usd(b, price)),
        "timestamp": unix_timestamp(),
    })))
}

/// `POST /api/claim/earnings` redeems credits to the caller's wallet.
pub async fn claim_earnings(
    State(state): State<AppState>,
    Json(request): Json<ClaimEarningsRequest>,
) -> TreasuryResult<Response> {
    let engine = state.treasury.engine()?;
    let amount = parse_eth_amount(request.amount_eth)?;

    let settlement = engine.redeem(&request.user_wallet, amount).await?;
    Ok(settlement_response(&state, settlement))
}

/// `GET /api/user/credits/{address}`
pub async fn user_credits(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> TreasuryResult<Json<CreditsResponse>> {
    let identity = identity::normalize(&address)?;
    let balance = state.ledger.balance_of(&identity);

    Ok(Json(CreditsResponse {
        wallet: identity,
        credits_eth: wei_to_eth(balance),
        credits_usd: wei_to_usd(balance, state.config.pricing.eth_price_usd),
        can_claim: !balance.is_zero(),
    }))
}

/// `GET /api/tx/{hash}` reports a broadcast transaction's on-chain status.
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(raw_hash): Path<String>,
) -> TreasuryResult<Json<serde_json::Value>> {
    let tx_hash: TxHash = raw_hash
        .parse()
        .map_err(|e| TreasuryError::InvalidTxHash(format!("{raw_hash}: {e}")))?;
    let engine = state.treasury.engine()?;
    let status = engine.status(tx_hash).await?;
    let hash = tx_hash.to_string();

    let mut body = json!({
        "txHash": hash,
        "etherscanUrl": state.config.chain.explorer_link(&hash),
    });
    if let (Some(target), serde_json::Value::Object(fields)) = (body.as_object_mut(), status_fields(status)) {
        target.extend(fields);
    }
    Ok(Json(body))
}

fn status_fields(status: TransferStatus) -> serde_json::Value {
    match status {
        TransferStatus::Pending => json!({ "status": "pending" }),
        TransferStatus::Confirmed { block_number, fee_paid } => json!({
            "status": "confirmed",
            "blockNumber": block_number,
            "gasUsed": format!("{:.6}", wei_to_eth(fee_paid)),
        }),
        TransferStatus::Reverted { block_number, fee_paid } => json!({
            "status": "reverted",
            "blockNumber": block_number,
            "gasUsed": format!("{:.6}", wei_to_eth(fee_paid)),
        }),
    }
}

/// Render a settlement: 200 when confirmed, 202 when the receipt is still
/// outstanding.
pub(crate) fn settlement_response(state: &AppState, settlement: Settlement) -> Response {
    match settlement {
        Settlement::Confirmed(outcome) => confirmed_body(state, outcome).into_response(),
        Settlement::Pending(pending) => {
            (StatusCode::ACCEPTED, pending_body(state, pending)).into_response()
        }
    }
}

fn confirmed_body(state: &AppState, outcome: SettlementOutcome) -> Json<serde_json::Value> {
    let hash = outcome.tx_hash.to_string();
    let mut body = json!({
        "success": outcome.success,
        "txHash": hash,
        "blockNumber": outcome.block_number,
        "gasUsed": format!("{:.6}", wei_to_eth(outcome.fee_paid)),
        "amountSent": wei_to_eth(outcome.amount),
        "recipient": outcome.recipient,
        "etherscanUrl": state.config.chain.explorer_link(&hash),
        "timestamp": unix_timestamp(),
    });
    if let (Some(fields), Some(remaining)) = (body.as_object_mut(), outcome.remaining_credits) {
        fields.insert("user_remaining_credits".into(), json!(wei_to_eth(remaining)));
    }
    Json(body)
}

fn pending_body(state: &AppState, pending: PendingSettlement) -> Json<serde_json::Value> {
    let hash = pending.tx_hash.to_string();
    Json(json!({
        "success": false,
        "status": "timed_out",
        "txHash": hash,
        "amount": wei_to_eth(pending.amount),
        "recipient": pending.recipient,
        "etherscanUrl": state.config.chain.explorer_link(&hash),
        "ledger_debited": false,
        "message": format!(
            "No receipt after {}s; the transfer may still be mined. Credits were not deducted.",
            pending.waited.as_secs()
        ),
        "timestamp": unix_timestamp(),
    }))
}
