//! Credit Treasury (v1)
//!
//! Custodial credit ledger with on-chain ETH settlement, served over Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                   CREDIT TREASURY                    │
//!                    │                                                      │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ handlers │───▶│     ledger     │   │
//!                    │  │ server  │    │ / admin  │    │ (credit/hold)  │   │
//!                    │  └─────────┘    └────┬─────┘    └───────▲────────┘   │
//!                    │                      │                  │            │
//!                    │                      ▼                  │ commit /   │
//!                    │               ┌──────────────┐          │ release    │
//!                    │               │  settlement  │──────────┘            │
//!                    │               │    engine    │                       │
//!                    │               └──────┬───────┘                       │
//!                    │                      ▼                               │
//!                    │               ┌──────────────┐     ┌─────────────┐   │
//!                    │               │  blockchain  │────▶│ Ethereum    │───┼──▶ RPC
//!                    │               │ signer + rpc │     │ node(s)     │   │
//!                    │               └──────────────┘     └─────────────┘   │
//!                    │                                                      │
//!                    │   config · observability · lifecycle (cross-cutting) │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use credit_treasury::config::load_config;
use credit_treasury::http::HttpServer;
use credit_treasury::ledger::LedgerStore;
use credit_treasury::lifecycle::{initialize_treasury, signals, Shutdown};
use credit_treasury::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "credit-treasury")]
#[command(about = "Custodial credit ledger with on-chain ETH settlement", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("credit-treasury v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        chain_id = config.chain.chain_id,
        network = %config.chain.network_name,
        request_timeout_secs = config.timeouts.request_secs,
        admin_enabled = config.admin.api_key.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let ledger = Arc::new(LedgerStore::new());
    let treasury = initialize_treasury(&config, Arc::clone(&ledger)).await;
    tracing::info!(mode = treasury.label(), "Treasury initialized");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::listen_for_shutdown(shutdown));

    HttpServer::new(config, ledger, treasury)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
