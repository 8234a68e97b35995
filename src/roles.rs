use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The closed set of role tags a portal identity can carry. The serialized form is the
/// exact, case-sensitive tag used by the user directory (e.g. `"SuperAdministrateur"`).
///
/// Every variant has a registry entry (see [`RoleRoutes::for_role`]), so once a tag has been
/// parsed into a `Role` the "unsupported role" fallback can no longer occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Role {
    Administrateur,
    SuperAdministrateur,
    Caissier,
    Maire,
    Ordonnateur,
    Percepteur,
    Tresorier,
    Contribuable,
}

impl Role {
    /// Every role, in registry order.
    pub const ALL: [Role; 8] = [
        Role::Administrateur,
        Role::SuperAdministrateur,
        Role::Caissier,
        Role::Maire,
        Role::Ordonnateur,
        Role::Percepteur,
        Role::Tresorier,
        Role::Contribuable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrateur => "Administrateur",
            Role::SuperAdministrateur => "SuperAdministrateur",
            Role::Caissier => "Caissier",
            Role::Maire => "Maire",
            Role::Ordonnateur => "Ordonnateur",
            Role::Percepteur => "Percepteur",
            Role::Tresorier => "Tresorier",
            Role::Contribuable => "Contribuable",
        }
    }

    /// Shorthand for the registry entry of this role.
    pub fn routes(&self) -> &'static RoleRoutes {
        RoleRoutes::for_role(*self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a tag is not one of the eight known roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role tag '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact, case-sensitive match. `"administrateur"` is *not* a role.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == tag)
            .ok_or_else(|| UnknownRole(tag.to_string()))
    }
}

/// RoleRoutes
///
/// A Role Registry entry: the base path prefix owning the role's subtree, the landing path
/// used after login, and the named sub-routes exposed by the role's sidebar.
///
/// Entries are `'static` and immutable; they are process-wide configuration, never owned
/// by a session.
#[derive(Debug)]
pub struct RoleRoutes {
    pub base: &'static str,
    pub default: &'static str,
    /// Ordered (name, absolute path) pairs.
    pub routes: &'static [(&'static str, &'static str)],
}

static ADMINISTRATEUR: RoleRoutes = RoleRoutes {
    base: "/administrateur",
    default: "/administrateur/tableau_de_bord",
    routes: &[
        ("tableau_de_bord", "/administrateur/tableau_de_bord"),
        ("utilisateurs", "/administrateur/utilisateurs"),
        ("transactions", "/administrateur/transactions"),
        ("rapport", "/administrateur/rapport"),
        ("configuration", "/administrateur/configuration"),
    ],
};

static SUPER_ADMINISTRATEUR: RoleRoutes = RoleRoutes {
    base: "/superadmin",
    default: "/superadmin/configuration",
    routes: &[
        ("configuration", "/superadmin/configuration"),
        ("utilisateurs", "/superadmin/utilisateurs"),
    ],
};

static CAISSIER: RoleRoutes = RoleRoutes {
    base: "/caissier",
    default: "/caissier/tableau_de_bord",
    routes: &[
        ("tableau_de_bord", "/caissier/tableau_de_bord"),
        ("transactions", "/caissier/transactions"),
    ],
};

static MAIRE: RoleRoutes = RoleRoutes {
    base: "/maire",
    default: "/maire/tableau_de_bord",
    routes: &[("tableau_de_bord", "/maire/tableau_de_bord")],
};

static ORDONNATEUR: RoleRoutes = RoleRoutes {
    base: "/ordonnateur",
    default: "/ordonnateur/tableau_de_bord",
    routes: &[
        ("tableau_de_bord", "/ordonnateur/tableau_de_bord"),
        ("configuration", "/ordonnateur/configuration"),
        ("utilisateurs", "/ordonnateur/utilisateurs"),
        ("transactions", "/ordonnateur/transactions"),
        ("rapport", "/ordonnateur/rapport"),
    ],
};

static PERCEPTEUR: RoleRoutes = RoleRoutes {
    base: "/percepteur",
    default: "/percepteur/tableau_de_bord",
    routes: &[("tableau_de_bord", "/percepteur/tableau_de_bord")],
};

static TRESORIER: RoleRoutes = RoleRoutes {
    base: "/tresorier",
    default: "/tresorier/tableau_de_bord",
    routes: &[("tableau_de_bord", "/tresorier/tableau_de_bord")],
};

static CONTRIBUABLE: RoleRoutes = RoleRoutes {
    base: "/contribuable",
    default: "/contribuable/tableau_de_bord",
    routes: &[("tableau_de_bord", "/contribuable/tableau_de_bord")],
};

impl RoleRoutes {
    pub fn for_role(role: Role) -> &'static RoleRoutes {
        match role {
            Role::Administrateur => &ADMINISTRATEUR,
            Role::SuperAdministrateur => &SUPER_ADMINISTRATEUR,
            Role::Caissier => &CAISSIER,
            Role::Maire => &MAIRE,
            Role::Ordonnateur => &ORDONNATEUR,
            Role::Percepteur => &PERCEPTEUR,
            Role::Tresorier => &TRESORIER,
            Role::Contribuable => &CONTRIBUABLE,
        }
    }

    /// Looks up a named sub-route, falling back to the default path for unknown names.
    pub fn route(&self, name: &str) -> &'static str {
        self.routes
            .iter()
            .find(|(route_name, _)| *route_name == name)
            .map(|(_, path)| *path)
            .unwrap_or(self.default)
    }

    /// True when `path` is the base itself or lies underneath it.
    ///
    /// `/administrateurs/x` is not under `/administrateur`; the match is segment-aware.
    pub fn owns(&self, path: &str) -> bool {
        match path.strip_prefix(self.base) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// default_path_for
///
/// The registry's declared landing path for `role`. Used for post-login navigation when no
/// return-context exists and for the redirect of unmatched sub-paths.
pub fn default_path_for(role: Role) -> &'static str {
    RoleRoutes::for_role(role).default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_exactly() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("administrateur".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_the_tag() {
        let json = serde_json::to_string(&Role::SuperAdministrateur).unwrap();
        assert_eq!(json, "\"SuperAdministrateur\"");
    }

    #[test]
    fn owns_is_segment_aware() {
        let admin = Role::Administrateur.routes();
        assert!(admin.owns("/administrateur"));
        assert!(admin.owns("/administrateur/utilisateurs"));
        assert!(!admin.owns("/administrateurs/utilisateurs"));
        assert!(!admin.owns("/superadmin"));
    }

    #[test]
    fn named_route_falls_back_to_default() {
        let caissier = Role::Caissier.routes();
        assert_eq!(caissier.route("transactions"), "/caissier/transactions");
        assert_eq!(caissier.route("rapport"), "/caissier/tableau_de_bord");
    }
}
