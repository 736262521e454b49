use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::error::ErrorBody;
use crate::http::server::AppState;

/// Bearer-token gate for admin routes.
///
/// No configured key disables the routes outright (403).
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.config.admin.api_key.as_deref() else {
        tracing::warn!(path = %request.uri().path(), "Admin route called with admin access disabled");
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorBody::new("admin_disabled", "Admin access is not configured")),
        )
            .into_response();
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) if tokens_match(token.as_bytes(), expected.as_bytes()) => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody::new("unauthorized", "Missing or invalid bearer token")),
            )
                .into_response()
        }
    }
}

/// Comparison whose duration does not depend on where the inputs differ.
fn tokens_match(given: &[u8], expected: &[u8]) -> bool {
    if given.len() != expected.len() {
        return false;
    }
    given
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(b"secret-admin-key", b"secret-admin-key"));
        assert!(!tokens_match(b"secret-admin-kez", b"secret-admin-key"));
        assert!(!tokens_match(b"secret", b"secret-admin-key"));
        assert!(!tokens_match(b"", b"secret-admin-key"));
    }
}
