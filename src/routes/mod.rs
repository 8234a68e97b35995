/// Router Module Index
///
/// Routes are grouped by the access they require. The layers that enforce it are applied in
/// `create_router`, so a route cannot end up in a group without its protection.

/// Health check, session creation. No session required.
pub mod public;

/// Login, logout and layout chrome. Requires a live session.
pub mod session;

/// User-management CRUD. Requires a live session; each handler also guards for the
/// SuperAdministrateur role.
pub mod management;

/// Recette configuration. Requires a live session; each handler also guards for the
/// Administrateur role.
pub mod configuration;
