//! Operator-only routes.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::post, Router};

use self::auth::admin_auth_middleware;
use self::handlers::transfer_eth;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/transfer/eth", post(transfer_eth))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
