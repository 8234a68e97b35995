use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::route_table::ConfigError;

/// Message shown inline on the login form when no directory record matches.
pub const LOGIN_FAILED_MESSAGE: &str = "Email ou mot de passe incorrect";

/// PortalError
///
/// Every failure the portal reports to a client. All of them are locally recovered: the
/// session stays usable after any of these.
///
/// Role mismatches are absent on purpose: the access guard answers those with a redirect
/// to `/login`, not an error body.
#[derive(Debug, Error)]
pub enum PortalError {
    /// No directory record matched the submitted email and password.
    #[error("Email ou mot de passe incorrect")]
    AuthenticationFailure,

    /// A login submit arrived while an earlier one was still waiting on the credential check.
    #[error("a login attempt is already in progress")]
    LoginInProgress,

    /// The session navigated away before the credential check finished.
    #[error("login attempt was cancelled by navigation")]
    LoginCancelled,

    /// A configuration form was submitted with a required field left empty.
    #[error("Veuillez remplir tous les champs obligatoires")]
    Validation,

    /// Missing, expired, or unknown session token.
    #[error("invalid or expired session")]
    InvalidSession,

    #[error("route configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("failed to sign session token: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),
}

impl PortalError {
    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::AuthenticationFailure | PortalError::InvalidSession => {
                StatusCode::UNAUTHORIZED
            }
            PortalError::LoginInProgress | PortalError::LoginCancelled => StatusCode::CONFLICT,
            PortalError::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::Configuration(_) | PortalError::TokenSigning(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failure_carries_the_inline_message() {
        assert_eq!(
            PortalError::AuthenticationFailure.to_string(),
            "Email ou mot de passe incorrect"
        );
        assert_eq!(
            PortalError::AuthenticationFailure.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn login_races_are_conflicts() {
        assert_eq!(PortalError::LoginInProgress.status(), StatusCode::CONFLICT);
        assert_eq!(PortalError::LoginCancelled.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn empty_required_fields_are_unprocessable() {
        assert_eq!(
            PortalError::Validation.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            PortalError::Validation.to_string(),
            "Veuillez remplir tous les champs obligatoires"
        );
    }
}
