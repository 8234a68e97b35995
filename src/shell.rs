use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    guard::{self, AccessDecision, LOGIN_PATH},
    models::Identity,
    roles::{Role, default_path_for},
    route_table::{ConfigError, Page, routes_for},
};

/// Notice rendered when an identity carries a role tag with no registry entry.
pub const UNSUPPORTED_ROLE_NOTICE: &str = "Rôle non supporté";

/// ShellState
///
/// Which subtree the shell mounts. Derived from the session identity on every navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellState {
    Unauthenticated,
    Role(Role),
    UnsupportedRole(String),
}

impl ShellState {
    pub fn of(identity: Option<&Identity>) -> Self {
        match identity {
            None => ShellState::Unauthenticated,
            Some(identity) => match identity.known_role() {
                Some(role) => ShellState::Role(role),
                None => ShellState::UnsupportedRole(identity.role.clone()),
            },
        }
    }
}

/// Resolution
///
/// What the client should do for a requested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Resolution {
    /// Render the login screen.
    Login,
    /// Render `page` inside the layout of `role`.
    Page {
        role: Role,
        path: String,
        page: Page,
        title: String,
    },
    /// Navigate to `to`, replacing the current history entry.
    Redirect { to: String, from: Option<String> },
    /// Terminal notice for a role tag the portal does not know.
    UnsupportedRole { role: String, notice: String },
}

impl Resolution {
    fn to_login(from: &str) -> Self {
        Resolution::Redirect {
            to: LOGIN_PATH.to_string(),
            from: Some(from.to_string()),
        }
    }

    fn to_default(role: Role) -> Self {
        Resolution::Redirect {
            to: default_path_for(role).to_string(),
            from: None,
        }
    }
}

/// Strips query, fragment and trailing slash; the empty path becomes `/`.
pub fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// resolve
///
/// The top-level dispatcher.
///
/// * Unauthenticated, or the application root: only `/login` renders, everything else
///   redirects there carrying the requested path.
/// * Known role: paths under the role's base resolve against its route table behind the
///   access guard; the bare base selects the index route. Anything else, `/login`
///   included, redirects to the role's default path.
/// * Unknown role tag: the static notice, whatever the path.
///
/// # Errors
/// A [`ConfigError`] if the role's route table cannot be built. [`crate::route_table::validate_all`]
/// runs at startup, so this does not happen with the shipped registry.
pub fn resolve(identity: Option<&Identity>, path: &str) -> Result<Resolution, ConfigError> {
    let path = normalize(path);

    let state = ShellState::of(identity);
    if state == ShellState::Unauthenticated || path == "/" {
        return Ok(if path == LOGIN_PATH {
            Resolution::Login
        } else {
            Resolution::to_login(path)
        });
    }

    let role = match state {
        ShellState::Role(role) => role,
        ShellState::UnsupportedRole(tag) => {
            return Ok(Resolution::UnsupportedRole {
                role: tag,
                notice: UNSUPPORTED_ROLE_NOTICE.to_string(),
            });
        }
        ShellState::Unauthenticated => return Ok(Resolution::to_login(path)),
    };

    let table = routes_for(role)?;
    let Some(subpath) = path
        .strip_prefix(table.base)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    else {
        return Ok(Resolution::to_default(role));
    };

    if let AccessDecision::RedirectToLogin { from } = guard::check(identity, role, path) {
        return Ok(Resolution::to_login(&from));
    }

    Ok(match table.match_subpath(subpath) {
        Some(entry) => Resolution::Page {
            role,
            path: table.absolute(entry),
            page: entry.page,
            title: entry.page.title(),
        },
        None => Resolution::to_default(role),
    })
}

/// redirect_after_login
///
/// Post-login destination: the return-context when it is an in-app path inside the
/// identity's own subtree, otherwise the role's default path. Anything else (absolute or
/// protocol-relative URLs, other schemes, another role's paths) is dropped. An unsupported
/// role goes to `/`, where the notice is shown.
pub fn redirect_after_login(identity: &Identity, from: Option<&str>) -> String {
    let Some(role) = identity.known_role() else {
        return "/".to_string();
    };
    let routes = role.routes();
    from.filter(|raw| raw.starts_with('/') && !raw.starts_with("//") && !raw.contains('\\'))
        .map(normalize)
        .filter(|path| routes.owns(path))
        .map_or_else(|| routes.default.to_string(), str::to_string)
}
