use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    directory::UserDirectory,
    error::PortalError,
    models::{Identity, LoginRequest, LoginResponse},
    session::{Session, SessionState},
    shell,
};

/// Header accepted in `Env::Local` instead of a bearer token.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Claims
///
/// Payload of a session token. The token only names a session; the identity lives in the
/// session store and can change (login, logout) without reissuing the token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Session id.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// issue_token
///
/// Signs a token for `session_id` that expires after the configured session TTL.
pub fn issue_token(session_id: Uuid, config: &AppConfig) -> Result<String, PortalError> {
    let now = Utc::now().timestamp().max(0) as usize;
    let ttl = usize::try_from(config.session_ttl.as_secs()).unwrap_or(usize::MAX);
    let claims = Claims {
        sub: session_id,
        iat: now,
        exp: now.saturating_add(ttl),
    };
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// CurrentSession
///
/// The session a request belongs to. Usable as a handler argument on every route that needs
/// a session; `Option<CurrentSession>` is used where an anonymous caller is acceptable.
///
/// Resolution order:
/// 1. `Env::Local` only: an `x-session-id` header naming a live session.
/// 2. `Authorization: Bearer <token>`, validated (signature and expiry) and looked up in the
///    session registry.
///
/// Rejection: [`PortalError::InvalidSession`] (401).
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Arc<Session>);

async fn resolve_session<S>(parts: &Parts, state: &S) -> Result<Arc<Session>, PortalError>
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let sessions = SessionState::from_ref(state);
    let config = AppConfig::from_ref(state);

    if config.env == Env::Local {
        let bypass = parts
            .headers
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok());
        if let Some(session_id) = bypass {
            if let Some(session) = sessions.get(session_id).await {
                return Ok(session);
            }
        }
    }

    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(PortalError::InvalidSession)?;

    let mut validation = Validation::default();
    validation.validate_exp = true;
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let claims = decode::<Claims>(token, &key, &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            PortalError::InvalidSession
        })?
        .claims;

    sessions
        .get(claims.sub)
        .await
        .ok_or(PortalError::InvalidSession)
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve_session(parts, state).await.map(CurrentSession)
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    /// Any failure is treated as "no session", i.e. an unauthenticated visitor.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(resolve_session(parts, state).await.ok().map(CurrentSession))
    }
}

/// login
///
/// The login-form submit for one session.
///
/// 1. Admit the attempt through the session's login gate (re-entrant submits are refused).
/// 2. Wait `delay`, standing in for network latency.
/// 3. Check the credentials against the directory.
/// 4. Apply the result only if nothing cancelled the attempt meanwhile.
///
/// On failure the identity is left as it was and the gate is reopened.
///
/// # Errors
/// `LoginInProgress`, `LoginCancelled` or `AuthenticationFailure`.
pub async fn login(
    session: &Session,
    directory: &dyn UserDirectory,
    request: LoginRequest,
    delay: Duration,
) -> Result<LoginResponse, PortalError> {
    let attempt = session.login_gate.begin()?;

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let record = directory
        .find_by_credentials(&request.email, &request.password)
        .await;

    if !attempt.finish() {
        tracing::info!(session_id = %session.id, "stale login result discarded");
        return Err(PortalError::LoginCancelled);
    }

    let Some(record) = record else {
        tracing::info!(session_id = %session.id, "credential check failed");
        return Err(PortalError::AuthenticationFailure);
    };

    let identity = Identity::from(&record);
    session.store.login(identity.clone());
    let redirect_to = shell::redirect_after_login(&identity, request.from.as_deref());

    Ok(LoginResponse {
        identity,
        redirect_to,
    })
}
