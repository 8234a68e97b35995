use crate::{models::Identity, roles::Role};

/// The only path reachable without an identity.
pub const LOGIN_PATH: &str = "/login";

/// AccessDecision
///
/// Outcome of [`check`]. A redirect always targets [`LOGIN_PATH`]; `from` is the
/// return-context the login screen uses to resume navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Render,
    RedirectToLogin { from: String },
}

/// check
///
/// Gate for a subtree that requires `required`.
///
/// 1. The login screen itself always renders, which keeps redirects from looping.
/// 2. No identity: redirect to login with the attempted path as return-context.
/// 3. Identity with a different role: redirect to login as well. There is no "forbidden"
///    page; a mismatch looks exactly like being logged out.
/// 4. Otherwise render.
pub fn check(identity: Option<&Identity>, required: Role, current_path: &str) -> AccessDecision {
    if current_path == LOGIN_PATH {
        return AccessDecision::Render;
    }

    let redirect = || AccessDecision::RedirectToLogin {
        from: current_path.to_string(),
    };

    match identity {
        None => redirect(),
        Some(identity) if identity.role != required.as_str() => {
            tracing::debug!(
                have = %identity.role,
                need = %required,
                path = current_path,
                "role mismatch, redirecting to login"
            );
            redirect()
        }
        Some(_) => AccessDecision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_role(role: Role) -> Identity {
        Identity {
            display_name: "Test".to_string(),
            role: role.as_str().to_string(),
            avatar: None,
        }
    }

    #[test]
    fn login_path_always_renders() {
        assert_eq!(check(None, Role::Maire, "/login"), AccessDecision::Render);
        let other = as_role(Role::Caissier);
        assert_eq!(
            check(Some(&other), Role::Maire, "/login"),
            AccessDecision::Render
        );
    }

    #[test]
    fn anonymous_requests_carry_return_context() {
        assert_eq!(
            check(None, Role::Administrateur, "/administrateur/utilisateurs"),
            AccessDecision::RedirectToLogin {
                from: "/administrateur/utilisateurs".to_string()
            }
        );
    }

    #[test]
    fn every_mismatched_pair_redirects_to_login() {
        for have in Role::ALL {
            let identity = as_role(have);
            for need in Role::ALL {
                let path = need.routes().default;
                let decision = check(Some(&identity), need, path);
                if have == need {
                    assert_eq!(decision, AccessDecision::Render);
                } else {
                    assert_eq!(
                        decision,
                        AccessDecision::RedirectToLogin {
                            from: path.to_string()
                        }
                    );
                }
            }
        }
    }
}
