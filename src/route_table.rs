use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::roles::{Role, RoleRoutes};

/// Page
///
/// The screens a role subtree can mount. The client owns their content; the shell only
/// decides *which* one is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Page {
    TableauDeBord,
    Utilisateurs,
    Transactions,
    Rapport,
    Configuration,
}

impl Page {
    fn from_route_name(name: &str) -> Option<Page> {
        match name {
            "tableau_de_bord" => Some(Page::TableauDeBord),
            "utilisateurs" => Some(Page::Utilisateurs),
            "transactions" => Some(Page::Transactions),
            "rapport" => Some(Page::Rapport),
            "configuration" => Some(Page::Configuration),
            _ => None,
        }
    }

    /// Human label used by the sidebar.
    pub fn label(&self) -> &'static str {
        match self {
            Page::TableauDeBord => "Tableau de bord",
            Page::Utilisateurs => "Utilisateurs",
            Page::Transactions => "Transactions",
            Page::Rapport => "Rapport",
            Page::Configuration => "Configuration",
        }
    }

    /// Document title shown by the browser tab.
    pub fn title(&self) -> String {
        format!("Anjaranaka - {}", self.label())
    }
}

/// Construction-time problems with a role's route configuration.
///
/// These are caught by [`validate_all`] at startup and in tests; they never reach a user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("route table for {role} declares '{path}' more than once")]
    DuplicatePath { role: Role, path: String },

    #[error("route table for {role} has {count} index routes, expected exactly one")]
    IndexCount { role: Role, count: usize },

    #[error("default path '{default}' for {role} is not under base '{base}'")]
    DefaultOutsideBase {
        role: Role,
        default: String,
        base: String,
    },

    #[error("route '{path}' for {role} is not under base '{base}'")]
    RouteOutsideBase {
        role: Role,
        path: String,
        base: String,
    },

    #[error("route name '{name}' for {role} does not map to a page")]
    UnknownPage { role: Role, name: String },
}

/// RouteEntry
///
/// One binding inside a role subtree. `path` is relative to the role's base
/// (`"utilisateurs"`, never `"/administrateur/utilisateurs"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteEntry {
    pub path: String,
    pub page: Page,
    pub index: bool,
}

/// RouteTable
///
/// The ordered route list for a single role, normalized so that exactly one entry carries
/// `index = true` and no two entries share a path.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub role: Role,
    pub base: &'static str,
    pub default: &'static str,
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// build
    ///
    /// Composes pages with the registry entry's base path. The entry whose absolute path
    /// equals the registry default becomes the index route.
    ///
    /// # Errors
    /// Any [`ConfigError`] describing why the registry entry is not a valid route table.
    pub fn build(role: Role, registry: &RoleRoutes) -> Result<Self, ConfigError> {
        if !registry.owns(registry.default) || registry.default == registry.base {
            return Err(ConfigError::DefaultOutsideBase {
                role,
                default: registry.default.to_string(),
                base: registry.base.to_string(),
            });
        }

        let mut entries: Vec<RouteEntry> = Vec::with_capacity(registry.routes.len());
        for (name, absolute) in registry.routes {
            let relative = absolute
                .strip_prefix(registry.base)
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty())
                .ok_or_else(|| ConfigError::RouteOutsideBase {
                    role,
                    path: absolute.to_string(),
                    base: registry.base.to_string(),
                })?;

            if entries.iter().any(|entry| entry.path == relative) {
                return Err(ConfigError::DuplicatePath {
                    role,
                    path: relative.to_string(),
                });
            }

            let page = Page::from_route_name(name).ok_or_else(|| ConfigError::UnknownPage {
                role,
                name: name.to_string(),
            })?;

            entries.push(RouteEntry {
                path: relative.to_string(),
                page,
                index: *absolute == registry.default,
            });
        }

        let index_count = entries.iter().filter(|entry| entry.index).count();
        if index_count != 1 {
            return Err(ConfigError::IndexCount {
                role,
                count: index_count,
            });
        }

        Ok(Self {
            role,
            base: registry.base,
            default: registry.default,
            entries,
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn index(&self) -> &RouteEntry {
        // `build` guarantees exactly one index entry.
        &self.entries[self
            .entries
            .iter()
            .position(|entry| entry.index)
            .unwrap_or_default()]
    }

    /// match_subpath
    ///
    /// Resolves a path relative to the base. The empty sub-path selects the index route.
    pub fn match_subpath(&self, subpath: &str) -> Option<&RouteEntry> {
        let subpath = subpath.trim_matches('/');
        if subpath.is_empty() {
            return Some(self.index());
        }
        self.entries.iter().find(|entry| entry.path == subpath)
    }

    /// Absolute path of an entry.
    pub fn absolute(&self, entry: &RouteEntry) -> String {
        format!("{}/{}", self.base, entry.path)
    }
}

/// routes_for
///
/// Builds the route table of `role` from the static Role Registry.
pub fn routes_for(role: Role) -> Result<RouteTable, ConfigError> {
    RouteTable::build(role, RoleRoutes::for_role(role))
}

/// validate_all
///
/// Builds every role's table once. Called from `main` before the listener is bound so a
/// broken registry stops the process instead of surfacing during navigation.
pub fn validate_all() -> Result<(), ConfigError> {
    for role in Role::ALL {
        let table = routes_for(role)?;
        tracing::debug!(role = %role, routes = table.entries().len(), "route table validated");
    }
    Ok(())
}
