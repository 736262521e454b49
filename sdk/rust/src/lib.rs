//! Typed HTTP client for the credit treasury API.

pub mod client;

pub use client::{
    ApiError, CreditsResponse, HealthResponse, PendingTransfer, ReceiveResponse, SdkError,
    SettledTransfer, SettlementReply, TreasuryClient, TxStatusResponse,
};
