//! Administrative transfer authorization and ledger isolation.

use alloy::consensus::Transaction;
use alloy::primitives::Address;
use std::sync::Arc;
use treasury_sdk::{SettlementReply, TreasuryClient};

mod common;
use common::{eth, ReceiptMode, ScriptedChain, ADMIN_KEY, USER};

const RECIPIENT: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

#[tokio::test]
async fn test_transfer_requires_bearer_key() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain.clone()).await;

    let anonymous = TreasuryClient::new(&server.base_url);
    let err = anonymous.transfer(RECIPIENT, 0.1).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.code(), Some("unauthorized"));

    let wrong = TreasuryClient::new(&server.base_url).with_admin_key("integration-admin-key-0002");
    let err = wrong.transfer(RECIPIENT, 0.1).await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn test_transfer_disabled_without_key() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let mut config = common::test_config();
    config.admin.api_key = None;
    let server = common::spawn_server(config, move |ledger| common::connected(chain, ledger)).await;

    let client = TreasuryClient::new(&server.base_url).with_admin_key(ADMIN_KEY);
    let err = client.transfer(RECIPIENT, 0.1).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.code(), Some("admin_disabled"));
}

#[tokio::test]
async fn test_transfer_bypasses_ledger() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain.clone()).await;
    let client = TreasuryClient::new(&server.base_url).with_admin_key(ADMIN_KEY);

    client.receive(0.4, Some(USER)).await.unwrap();
    let reply = client.transfer(RECIPIENT, 1.5).await.unwrap();
    let SettlementReply::Confirmed(settled) = reply else {
        panic!("expected confirmation, got {reply:?}");
    };

    assert!(settled.success);
    assert_eq!(settled.amount_sent, 1.5);
    assert_eq!(settled.user_remaining_credits, None);
    assert_eq!(settled.recipient, "0x90F79bf6EB2c4f870365E785982E1f101E93b906");

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to(), Some(RECIPIENT.parse::<Address>().unwrap()));
    assert_eq!(sent[0].value(), eth(1_500));

    assert_eq!(client.credits(USER).await.unwrap().credits_eth, 0.4);
    assert_eq!(server.ledger.identity_count(), 1);
}

#[tokio::test]
async fn test_transfer_validates_before_chain() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain.clone()).await;
    let client = TreasuryClient::new(&server.base_url).with_admin_key(ADMIN_KEY);

    let err = client.transfer("0x90f79bf6", 0.1).await.unwrap_err();
    assert_eq!(err.code(), Some("invalid_identity"));

    let err = client.transfer(RECIPIENT, -0.1).await.unwrap_err();
    assert_eq!(err.code(), Some("invalid_amount"));

    let err = client.transfer(RECIPIENT, 9.999).await.unwrap_err();
    assert_eq!(err.code(), Some("treasury_illiquid"));

    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn test_transfer_in_ledger_only_mode() {
    let server = common::spawn_ledger_only().await;
    let client = TreasuryClient::new(&server.base_url).with_admin_key(ADMIN_KEY);

    let err = client.transfer(RECIPIENT, 0.1).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}
