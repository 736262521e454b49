//! Settlement subsystem.
//!
//! # Data Flow
//! ```text
//! redeem(identity, amount)                  transfer(recipient, amount)
//!     → normalize identity                      → normalize recipient
//!     → LedgerStore::reserve (hold)             │
//!     └──────────────┬──────────────────────────┘
//!                    → treasury balance ≥ amount + reserve
//!                    → [submit lock] nonce, gas price, sign, broadcast
//!                    → poll receipt until deadline
//!                    → Confirmed: hold.commit()
//!                    → Reverted / TimedOut / error: hold.release()
//! ```

pub mod engine;
pub mod types;

pub use engine::{SettlementEngine, SettlementSettings};
pub use types::{
    PendingSettlement, Settlement, SettlementKind, SettlementOutcome, SettlementState,
    TransferStatus,
};
