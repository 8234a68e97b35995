use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// configuration_routes
///
/// The administrator's recette configuration, nested under `/api/configuration`. The session
/// middleware applies; each handler runs the access guard for `Administrateur`.
pub fn configuration_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/recettes",
            get(handlers::list_recettes).post(handlers::create_recette),
        )
        .route(
            "/recettes/{id}",
            put(handlers::update_recette).delete(handlers::delete_recette),
        )
        .route("/recettes/{id}/toggle-active", post(handlers::toggle_recette))
}
