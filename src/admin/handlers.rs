use axum::{extract::State, response::Response, Json};
use serde::Deserialize;

use crate::error::TreasuryResult;
use crate::http::handlers::settlement_response;
use crate::http::server::AppState;
use crate::units::parse_eth_amount;

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "recipientAddress")]
    pub recipient_address: String,
    #[serde(rename = "amountETH")]
    pub amount_eth: f64,
}

/// `POST /api/transfer/eth` sends treasury funds without touching the ledger.
pub async fn transfer_eth(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> TreasuryResult<Response> {
    let engine = state.treasury.engine()?;
    let amount = parse_eth_amount(request.amount_eth)?;

    tracing::info!(recipient = %request.recipient_address, "Admin transfer requested");
    let settlement = engine.transfer(&request.recipient_address, amount).await?;
    Ok(settlement_response(&state, settlement))
}
