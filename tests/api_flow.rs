//! End-to-end credit and redemption flows over HTTP.

use alloy::consensus::Transaction;
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use treasury_sdk::{SettlementReply, TreasuryClient};

mod common;
use common::{eth, ReceiptMode, ScriptedChain, USER, USER_CHECKSUMMED};

#[tokio::test]
async fn test_credit_then_claim() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain.clone()).await;
    let client = TreasuryClient::new(&server.base_url);

    let receipt = client.receive(0.5, Some(USER)).await.unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.user_wallet.as_deref(), Some(USER_CHECKSUMMED));
    assert_eq!(receipt.user_total_credits, Some(0.5));
    assert_eq!(receipt.treasury_eth_balance, Some(10.0));

    let reply = client.claim(USER_CHECKSUMMED, 0.5).await.unwrap();
    let SettlementReply::Confirmed(settled) = reply else {
        panic!("expected confirmation, got {reply:?}");
    };
    assert!(settled.success);
    assert_eq!(settled.block_number, common::BLOCK_NUMBER);
    assert_eq!(settled.amount_sent, 0.5);
    assert_eq!(settled.recipient, USER_CHECKSUMMED);
    assert_eq!(settled.user_remaining_credits, Some(0.0));
    assert_eq!(settled.gas_used, "0.000231");
    assert!(settled.etherscan_url.ends_with(&settled.tx_hash));

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to(), Some(USER.parse::<Address>().unwrap()));
    assert_eq!(sent[0].value(), eth(500));

    let credits = client.credits(USER).await.unwrap();
    assert_eq!(credits.credits_eth, 0.0);
    assert!(!credits.can_claim);
}

#[tokio::test]
async fn test_claim_beyond_credits_rejected() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain.clone()).await;
    let client = TreasuryClient::new(&server.base_url);

    client.receive(0.1, Some(USER)).await.unwrap();
    let err = client.claim(USER, 0.2).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.code(), Some("insufficient_credits"));
    assert!(chain.sent().is_empty());
    assert_eq!(client.credits(USER).await.unwrap().credits_eth, 0.1);
}

#[tokio::test]
async fn test_address_casing_shares_balance() {
    let server = common::spawn_ledger_only().await;
    let client = TreasuryClient::new(&server.base_url);

    client.receive(0.25, Some(USER)).await.unwrap();
    client.receive(0.25, Some(&USER.to_uppercase().replacen("0X", "0x", 1))).await.unwrap();
    client.receive(0.25, Some(USER_CHECKSUMMED)).await.unwrap();

    let credits = client.credits(&USER.to_uppercase().replacen("0X", "0x", 1)).await.unwrap();
    assert_eq!(credits.wallet, USER_CHECKSUMMED);
    assert_eq!(credits.credits_eth, 0.75);
    assert_eq!(credits.credits_usd, 0.75 * 3450.0);
    assert!(credits.can_claim);
    assert_eq!(server.ledger.identity_count(), 1);
}

#[tokio::test]
async fn test_receive_without_wallet_credits_nobody() {
    let server = common::spawn_ledger_only().await;
    let client = TreasuryClient::new(&server.base_url);

    let receipt = client.receive(1.0, Some("not_connected")).await.unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.user_wallet, None);
    assert_eq!(receipt.amount_usd, 3450.0);
    assert_eq!(receipt.user_total_credits, None);
    assert_eq!(receipt.treasury_eth_balance, None);

    client.receive(1.0, None).await.unwrap();
    assert_eq!(server.ledger.identity_count(), 0);
    assert_eq!(server.ledger.total_credits(), U256::ZERO);
}

#[tokio::test]
async fn test_invalid_inputs() {
    let server = common::spawn_ledger_only().await;
    let client = TreasuryClient::new(&server.base_url);

    let err = client.receive(-1.0, Some(USER)).await.unwrap_err();
    assert_eq!(err.code(), Some("invalid_amount"));

    let err = client.receive(0.0, Some(USER)).await.unwrap_err();
    assert_eq!(err.code(), Some("invalid_amount"));

    let err = client.receive(1.0, Some("0x1234")).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.code(), Some("invalid_identity"));

    let err = client.receive(1.0, Some(&format!(" {USER}"))).await.unwrap_err();
    assert_eq!(err.code(), Some("invalid_identity"));
    assert_eq!(server.ledger.identity_count(), 0);

    let err = client.credits("alice").await.unwrap_err();
    assert_eq!(err.code(), Some("invalid_identity"));
}

#[tokio::test]
async fn test_confirmation_timeout_keeps_credits() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Never));
    let server = common::spawn_connected(chain.clone()).await;
    let client = TreasuryClient::new(&server.base_url);

    client.receive(0.3, Some(USER)).await.unwrap();
    let reply = client.claim(USER, 0.3).await.unwrap();
    let SettlementReply::Pending(pending) = reply else {
        panic!("expected pending, got {reply:?}");
    };

    assert!(!pending.success);
    assert_eq!(pending.status, "timed_out");
    assert!(!pending.ledger_debited);
    assert_eq!(chain.sent().len(), 1);
    assert_eq!(client.credits(USER).await.unwrap().credits_eth, 0.3);
    assert_eq!(server.ledger.held_of(&credit_treasury::identity::normalize(USER).unwrap()), U256::ZERO);

    let status = client.tx_status(&pending.tx_hash).await.unwrap();
    assert_eq!(status.status, "pending");
    assert_eq!(status.block_number, None);
}

#[tokio::test]
async fn test_revert_keeps_credits() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Revert));
    let server = common::spawn_connected(chain.clone()).await;
    let client = TreasuryClient::new(&server.base_url);

    client.receive(0.3, Some(USER)).await.unwrap();
    let err = client.claim(USER, 0.3).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.code(), Some("reverted"));
    assert_eq!(client.credits(USER).await.unwrap().credits_eth, 0.3);

    let hash = format!("{}", chain.sent()[0].tx_hash());
    let status = client.tx_status(&hash).await.unwrap();
    assert_eq!(status.status, "reverted");
    assert_eq!(status.block_number, Some(common::BLOCK_NUMBER));
}

#[tokio::test]
async fn test_illiquid_treasury_rejects_before_broadcast() {
    let chain = Arc::new(ScriptedChain::new(eth(101), ReceiptMode::Success));
    let server = common::spawn_connected(chain.clone()).await;
    let client = TreasuryClient::new(&server.base_url);

    client.receive(0.1, Some(USER)).await.unwrap();
    let err = client.claim(USER, 0.1).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.code(), Some("treasury_illiquid"));
    assert!(chain.sent().is_empty());
    assert_eq!(client.credits(USER).await.unwrap().credits_eth, 0.1);
}

#[tokio::test]
async fn test_concurrent_claims_never_overdraw() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain.clone()).await;
    let client = Arc::new(TreasuryClient::new(&server.base_url));

    client.receive(0.5, Some(USER)).await.unwrap();

    let claims: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.claim(USER, 0.2).await })
        })
        .collect();

    let mut confirmed = 0;
    for claim in claims {
        match claim.await.unwrap() {
            Ok(SettlementReply::Confirmed(_)) => confirmed += 1,
            Ok(other) => panic!("unexpected reply {other:?}"),
            Err(e) => assert_eq!(e.code(), Some("insufficient_credits")),
        }
    }

    assert_eq!(confirmed, 2);
    assert_eq!(chain.sent().len(), 2);
    let nonces: Vec<u64> = chain.sent().iter().map(|tx| tx.nonce()).collect();
    assert_eq!(nonces, vec![0, 1]);
    assert_eq!(server.ledger.total_credits(), eth(100));
}

#[tokio::test]
async fn test_ledger_only_mode() {
    let server = common::spawn_ledger_only().await;
    let client = TreasuryClient::new(&server.base_url);

    client.receive(0.5, Some(USER)).await.unwrap();

    let err = client.claim(USER, 0.1).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.code(), Some("chain_unreachable"));
    assert_eq!(client.credits(USER).await.unwrap().credits_eth, 0.5);

    let status = client.status().await.unwrap();
    assert_eq!(status["chain_mode"], "ledger_only");
    assert_eq!(status["chain_ready"], false);
    assert!(status["treasury_eth_balance"].is_null());

    let health = client.health().await.unwrap();
    assert!(!health.chain_ready);
}

#[tokio::test]
async fn test_health_totals() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain).await;
    let client = TreasuryClient::new(&server.base_url);

    client.receive(0.5, Some(USER)).await.unwrap();
    client
        .receive(0.25, Some("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc"))
        .await
        .unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.chain_ready);
    assert_eq!(health.total_users, 2);
    assert_eq!(health.total_credits_eth, 0.75);
    assert_eq!(health.treasury_balance_eth, Some(10.0));

    let status = client.status().await.unwrap();
    assert_eq!(status["chain_mode"], "connected");
    assert_eq!(status["treasury_address"], "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    assert_eq!(status["treasury_usd_balance"], 34_500.0);
}

#[tokio::test]
async fn test_malformed_tx_hash_rejected() {
    let chain = Arc::new(ScriptedChain::new(eth(10_000), ReceiptMode::Success));
    let server = common::spawn_connected(chain).await;
    let client = TreasuryClient::new(&server.base_url);

    let err = client.tx_status("0xnothex").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.code(), Some("invalid_tx_hash"));
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let server = common::spawn_ledger_only().await;
    let client = TreasuryClient::new(&server.base_url);
    client.health().await.unwrap();

    server.shutdown.trigger();
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server.handle)
        .await
        .expect("server stopped")
        .unwrap();
    assert!(result.is_ok());
}
