use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure body returned by the service for every non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub success: bool,
    /// Stable code such as `insufficient_credits`.
    pub error: String,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("treasury returned {status}: {} ({})", .body.error, .body.detail)]
    Api { status: u16, body: ApiError },

    #[error("unexpected {status} response: {text}")]
    Unexpected { status: u16, text: String },
}

impl SdkError {
    /// HTTP status of an API-level failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Unexpected { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// Machine-readable error code of an API-level failure.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(&body.error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub chain_ready: bool,
    pub treasury_balance_eth: Option<f64>,
    pub total_users: usize,
    pub total_credits_eth: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveResponse {
    pub success: bool,
    #[serde(rename = "amountETH")]
    pub amount_eth: f64,
    #[serde(rename = "amountUSD")]
    pub amount_usd: f64,
    #[serde(rename = "userWallet")]
    pub user_wallet: Option<String>,
    pub user_total_credits: Option<f64>,
    pub treasury_eth_balance: Option<f64>,
    pub treasury_usd_balance: Option<f64>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditsResponse {
    pub wallet: String,
    pub credits_eth: f64,
    pub credits_usd: f64,
    pub can_claim: bool,
}

/// A transfer with a successful receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct SettledTransfer {
    pub success: bool,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    #[serde(rename = "blockNumber")]
    pub block_number: u64,
    /// Fee paid in ETH, six decimals.
    #[serde(rename = "gasUsed")]
    pub gas_used: String,
    #[serde(rename = "amountSent")]
    pub amount_sent: f64,
    pub recipient: String,
    #[serde(rename = "etherscanUrl")]
    pub etherscan_url: String,
    /// Present for redemptions only.
    pub user_remaining_credits: Option<f64>,
    pub timestamp: u64,
}

/// A broadcast transfer whose receipt had not arrived in time.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingTransfer {
    pub success: bool,
    pub status: String,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub amount: f64,
    pub recipient: String,
    #[serde(rename = "etherscanUrl")]
    pub etherscan_url: String,
    pub ledger_debited: bool,
    pub message: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone)]
pub enum SettlementReply {
    Confirmed(SettledTransfer),
    Pending(PendingTransfer),
}

impl SettlementReply {
    pub fn tx_hash(&self) -> &str {
        match self {
            Self::Confirmed(settled) => &settled.tx_hash,
            Self::Pending(pending) => &pending.tx_hash,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxStatusResponse {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    /// `pending`, `confirmed` or `reverted`.
    pub status: String,
    #[serde(rename = "etherscanUrl")]
    pub etherscan_url: String,
    #[serde(rename = "blockNumber")]
    pub block_number: Option<u64>,
    #[serde(rename = "gasUsed")]
    pub gas_used: Option<String>,
}

#[derive(Serialize)]
struct ReceiveBody<'a> {
    #[serde(rename = "amountETH")]
    amount_eth: f64,
    #[serde(rename = "userWallet", skip_serializing_if = "Option::is_none")]
    user_wallet: Option<&'a str>,
    source: &'a str,
}

#[derive(Serialize)]
struct ClaimBody<'a> {
    #[serde(rename = "userWallet")]
    user_wallet: &'a str,
    #[serde(rename = "amountETH")]
    amount_eth: f64,
}

#[derive(Serialize)]
struct TransferBody<'a> {
    #[serde(rename = "recipientAddress")]
    recipient_address: &'a str,
    #[serde(rename = "amountETH")]
    amount_eth: f64,
}

pub struct TreasuryClient {
    client: Client,
    base_url: String,
    admin_key: Option<String>,
}

impl TreasuryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key: None,
        }
    }

    /// Attach the bearer key sent on admin routes.
    pub fn with_admin_key(mut self, key: &str) -> Self {
        self.admin_key = Some(key.to_string());
        self
    }

    /// `GET /` as raw JSON.
    pub async fn status(&self) -> Result<serde_json::Value, SdkError> {
        decode(self.client.get(self.url("/"))).await
    }

    pub async fn health(&self) -> Result<HealthResponse, SdkError> {
        decode(self.client.get(self.url("/health"))).await
    }

    /// Report earned credits, optionally for a connected wallet.
    pub async fn receive(
        &self,
        amount_eth: f64,
        user_wallet: Option<&str>,
    ) -> Result<ReceiveResponse, SdkError> {
        let body = ReceiveBody {
            amount_eth,
            user_wallet,
            source: "sdk",
        };
        decode(self.client.post(self.url("/api/treasury/receive")).json(&body)).await
    }

    pub async fn credits(&self, address: &str) -> Result<CreditsResponse, SdkError> {
        decode(self.client.get(self.url(&format!("/api/user/credits/{address}")))).await
    }

    /// Redeem credits to `user_wallet`.
    pub async fn claim(&self, user_wallet: &str, amount_eth: f64) -> Result<SettlementReply, SdkError> {
        let body = ClaimBody {
            user_wallet,
            amount_eth,
        };
        settlement(self.client.post(self.url("/api/claim/earnings")).json(&body)).await
    }

    /// Operator transfer; requires [`TreasuryClient::with_admin_key`].
    pub async fn transfer(
        &self,
        recipient_address: &str,
        amount_eth: f64,
    ) -> Result<SettlementReply, SdkError> {
        let body = TransferBody {
            recipient_address,
            amount_eth,
        };
        let mut request = self.client.post(self.url("/api/transfer/eth")).json(&body);
        if let Some(key) = &self.admin_key {
            request = request.bearer_auth(key);
        }
        settlement(request).await
    }

    pub async fn tx_status(&self, tx_hash: &str) -> Result<TxStatusResponse, SdkError> {
        decode(self.client.get(self.url(&format!("/api/tx/{tx_hash}")))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SdkError> {
    let resp = request.send().await?;
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(api_error(status, text));
    }
    serde_json::from_str(&text).map_err(|_| SdkError::Unexpected {
        status: status.as_u16(),
        text,
    })
}

async fn settlement(request: RequestBuilder) -> Result<SettlementReply, SdkError> {
    let resp = request.send().await?;
    let status = resp.status();
    let text = resp.text().await?;

    let parsed = match status {
        StatusCode::OK => serde_json::from_str(&text).map(SettlementReply::Confirmed),
        StatusCode::ACCEPTED => serde_json::from_str(&text).map(SettlementReply::Pending),
        _ => return Err(api_error(status, text)),
    };
    parsed.map_err(|_| SdkError::Unexpected {
        status: status.as_u16(),
        text,
    })
}

fn api_error(status: StatusCode, text: String) -> SdkError {
    match serde_json::from_str::<ApiError>(&text) {
        Ok(body) => SdkError::Api {
            status: status.as_u16(),
            body,
        },
        Err(_) => SdkError::Unexpected {
            status: status.as_u16(),
            text,
        },
    }
}
