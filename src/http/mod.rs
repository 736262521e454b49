//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, CORS, metrics)
//!     → handlers.rs (decode JSON, ledger / settlement call)
//!     → error.rs (TreasuryError → status code + JSON body)
//!     → Send to client
//! ```
//!
//! Admin routes are merged in from `crate::admin` behind bearer auth.

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
