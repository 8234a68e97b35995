use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// management_routes
///
/// CRUD over the in-memory management stores, nested under `/api/management`.
///
/// Access Control:
/// The session middleware rejects calls without a session token. Each handler then runs the
/// access guard for `SuperAdministrateur`; any other identity is redirected to `/login`.
pub fn management_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{id}",
            axum::routing::put(handlers::update_user).delete(handlers::delete_user),
        )
        .route(
            "/roles",
            get(handlers::list_roles).post(handlers::create_role),
        )
        .route(
            "/roles/{id}",
            axum::routing::put(handlers::update_role).delete(handlers::delete_role),
        )
        .route(
            "/permissions",
            get(handlers::list_permissions).post(handlers::create_permission),
        )
        .route(
            "/permissions/{id}",
            axum::routing::put(handlers::update_permission).delete(handlers::delete_permission),
        )
        // Read-only reference data for the role and user forms.
        .route("/applications", get(handlers::list_applications))
        .route("/citizens", get(handlers::list_citizens))
        // Directory accounts and their active/blocked status.
        .route("/directory", get(handlers::get_directory))
        .route(
            "/directory/{id}/toggle-status",
            post(handlers::toggle_directory_status),
        )
}
