use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// session_routes
///
/// Endpoints acting on the caller's own session. The identity may still be empty here;
/// only the session token is required.
pub fn session_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/login
        // Login form submit. Debounced per session; navigation cancels a pending attempt.
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/me", get(handlers::get_me))
        // GET /api/chrome
        // Navbar (greeting, notifications) and sidebar for the current role.
        .route("/api/chrome", get(handlers::get_chrome))
        .route("/api/chrome/select", post(handlers::select_item))
}
