use municipal_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router, route_table,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// main
///
/// Loads configuration, installs logging, validates the route tables and serves the portal.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: pretty locally, JSON in production.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "municipal_portal=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Route tables are static data; a broken one is a build defect, not a runtime state.
    if let Err(e) = route_table::validate_all() {
        tracing::error!(error = %e, "route configuration is invalid");
        panic!("FATAL: invalid route configuration: {e}");
    }

    // 4. Directory, management stores and session registry from the bundled fixtures.
    let bind_addr = config.bind_addr.clone();
    let app_state =
        AppState::seeded(config).expect("FATAL: bundled fixture data failed to parse.");

    // 5. Expired sessions are reaped in the background.
    let sessions = app_state.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.prune().await;
        }
    });

    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: cannot bind {bind_addr}: {e}"));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
