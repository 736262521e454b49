//! Credit Treasury Library
//!
//! Custodial credit ledger with on-chain ETH settlement.

pub mod admin;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod settlement;
pub mod units;

pub use config::schema::TreasuryConfig;
pub use error::{TreasuryError, TreasuryResult};
pub use http::HttpServer;
pub use identity::Identity;
pub use ledger::LedgerStore;
pub use lifecycle::{Shutdown, TreasuryMode};
pub use settlement::{Settlement, SettlementEngine};
