//! Credit ledger subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/treasury/receive
//!     → store.rs credit()             (earn)
//!
//! POST /api/claim/earnings
//!     → store.rs reserve()            (balance check + withhold, one lock)
//!     → [transfer built, signed, broadcast, polled]
//!     → hold.rs commit()              (Confirmed)
//!     → hold.rs release() / Drop      (Reverted, TimedOut, any error)
//! ```
//!
//! # Design Decisions
//! - Balances are wei (`U256`); arithmetic is exact and never negative
//! - Keys are normalized identities, never raw strings
//! - Volatile: state is lost on restart

pub mod hold;
pub mod store;

pub use hold::CreditHold;
pub use store::LedgerStore;
