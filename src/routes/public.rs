use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// public_routes
///
/// Endpoints reachable without a session token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check.
        .route("/health", get(|| async { "ok" }))
        // POST /api/session
        // Starts an unauthenticated session and returns its bearer token.
        .route("/api/session", post(handlers::create_session))
}
