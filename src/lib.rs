use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use std::sync::Arc;
use tracing::{Level, Span};

// --- Module Structure ---

// Role model and navigation core. Pure, no I/O.
pub mod chrome;
pub mod guard;
pub mod roles;
pub mod route_table;
pub mod shell;

// Session state, credential check and data access.
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod recettes;
pub mod repository;
pub mod session;

// HTTP surface.
pub mod handlers;
pub mod routes;
use auth::CurrentSession;
use routes::{configuration, management, public, session as session_routes};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use directory::{DirectoryState, InMemoryDirectory};
pub use error::PortalError;
pub use repository::{InMemoryRepository, RepositoryState};
pub use session::{SessionRegistry, SessionState};

/// ApiDoc
///
/// OpenAPI document for the portal, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_session, handlers::login, handlers::logout, handlers::get_me,
        handlers::navigate, handlers::get_chrome, handlers::select_item,
        handlers::list_users, handlers::create_user, handlers::update_user, handlers::delete_user,
        handlers::list_roles, handlers::create_role, handlers::update_role, handlers::delete_role,
        handlers::list_permissions, handlers::create_permission, handlers::update_permission,
        handlers::delete_permission, handlers::list_applications, handlers::list_citizens,
        handlers::get_directory, handlers::toggle_directory_status,
        handlers::list_recettes, handlers::create_recette, handlers::update_recette,
        handlers::delete_recette, handlers::toggle_recette
    ),
    components(
        schemas(
            roles::Role, route_table::Page, shell::Resolution,
            models::Identity, models::LoginRequest, models::LoginResponse, models::SessionCreated,
            models::SessionInfo, models::SelectItemRequest, models::LayoutView,
            models::SidebarItem, models::NotificationItem, models::NotificationKind,
            models::Application, models::Citizen, models::Permission, models::RoleRecord,
            models::UserAccount, models::AccountStatus, models::DirectoryUser,
            models::DirectoryOverview, models::Recette, models::RecetteKind,
            models::RecetteDraft, models::RecettePage,
        )
    ),
    tags(
        (name = "municipal-portal", description = "Municipal tax portal shell API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable container for every service a handler may need.
#[derive(Clone)]
pub struct AppState {
    /// Live client sessions, keyed by the id carried in the session token.
    pub sessions: SessionState,
    /// Credential check for the login form.
    pub directory: DirectoryState,
    /// User-management data, recette configuration and the notification feed.
    pub repo: RepositoryState,
    pub config: AppConfig,
}

impl AppState {
    /// State backed by the bundled fixtures.
    pub fn seeded(config: AppConfig) -> Result<Self, serde_json::Error> {
        Ok(Self {
            sessions: Arc::new(SessionRegistry::new(config.session_ttl)),
            directory: Arc::new(InMemoryDirectory::seeded()?),
            repo: Arc::new(InMemoryRepository::seeded()?),
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for DirectoryState {
    fn from_ref(app_state: &AppState) -> DirectoryState {
        app_state.directory.clone()
    }
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// session_middleware
///
/// Rejects requests that do not carry a live session (401) before any handler runs.
async fn session_middleware(_session: CurrentSession, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree:
/// * public routes (health, session creation, API docs);
/// * session routes, behind `session_middleware`;
/// * the management API under `/api/management`, behind the same middleware and the
///   per-handler SuperAdministrateur guard;
/// * the recette configuration under `/api/configuration`, behind the same middleware and
///   the per-handler Administrateur guard;
/// * the navigation fallback, which resolves every other `GET` through the shell.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(session_routes::session_routes().route_layer(
            middleware::from_fn_with_state(state.clone(), session_middleware),
        ))
        .nest(
            "/api/management",
            management::management_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                session_middleware,
            )),
        )
        .nest(
            "/api/configuration",
            configuration::configuration_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                session_middleware,
            )),
        )
        .fallback(handlers::navigate)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by the `x-request-id` set by the layer above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
