use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{any, get},
};

/// Public Router Module
///
/// Endpoints that are **unauthenticated**. The auth proxy must stay here since the
/// identity service itself is how a client obtains a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // ANY /api/auth/*
        // Relayed verbatim to the identity service (sign-in, sign-up, session cookies).
        // A transport failure answers 500 with code AUTH_FAILURE.
        .route("/api/auth/{*path}", any(handlers::auth_proxy::proxy_auth))
}
