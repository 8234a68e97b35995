use std::{env, time::Duration};

/// Fallback signing secret for local development only.
pub const LOCAL_JWT_SECRET: &str = "municipal-portal-local-secret";

/// Token and session lifetime when `SESSION_TTL_SECS` is unset (8 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(28_800);

/// AppConfig
///
/// Immutable configuration loaded once at startup and pulled into handlers via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the session-id header bypass and log format.
    pub env: Env,
    // Secret used to sign and validate session tokens.
    pub jwt_secret: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Artificial wait before the credential check resolves.
    pub login_delay: Duration,
    // Lifetime of an issued session token.
    pub session_ttl: Duration,
}

/// Env
///
/// `Local` enables developer conveniences (pretty logs, `x-session-id` bypass);
/// `Production` requires every secret to be set explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Test-friendly values: local environment and no login delay.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            login_delay: Duration::ZERO,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

fn millis_var(name: &str, default: u64) -> Duration {
    let value = env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default);
    Duration::from_millis(value)
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment (call `dotenv` first).
    ///
    /// # Panics
    /// In `Production`, panics when `PORTAL_JWT_SECRET` is missing so the portal never
    /// starts signing tokens with the public development secret.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("PORTAL_JWT_SECRET")
                .expect("FATAL: PORTAL_JWT_SECRET must be set in production."),
            Env::Local => {
                env::var("PORTAL_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string())
            }
        };

        let session_ttl = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map_or(DEFAULT_SESSION_TTL, Duration::from_secs);

        Self {
            env,
            jwt_secret,
            bind_addr: env::var("PORTAL_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            login_delay: millis_var("LOGIN_DELAY_MS", 1500),
            session_ttl,
        }
    }
}
