//! Error → HTTP response mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::TreasuryError;

/// JSON body for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub detail: String,
}

impl ErrorBody {
    pub fn new(error: &'static str, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error,
            detail: detail.into(),
        }
    }
}

/// Status code for each failure kind.
pub fn status_for(error: &TreasuryError) -> StatusCode {
    match error {
        TreasuryError::InvalidIdentity(_)
        | TreasuryError::InvalidTxHash(_)
        | TreasuryError::InvalidAmount(_)
        | TreasuryError::InsufficientCredits { .. }
        | TreasuryError::TreasuryIlliquid { .. } => StatusCode::BAD_REQUEST,
        TreasuryError::SigningFailure(_) | TreasuryError::Reverted { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TreasuryError::BroadcastFailure(_) => StatusCode::BAD_GATEWAY,
        TreasuryError::ChainUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for TreasuryError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }
        (status, Json(ErrorBody::new(self.code(), self.to_string()))).into_response()
    }
}
