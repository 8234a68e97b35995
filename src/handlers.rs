use crate::{
    AppState,
    auth::{self, CurrentSession},
    chrome,
    error::PortalError,
    guard::{self, AccessDecision, LOGIN_PATH},
    models::{
        Application, Citizen, DirectoryOverview, DirectoryUser, LayoutView, LoginRequest,
        LoginResponse, Permission, Recette, RecetteDraft, RecettePage, RecetteQuery, RoleRecord,
        SelectItemRequest, SessionCreated, SessionInfo, UserAccount,
    },
    recettes,
    roles::Role,
    session::Session,
    shell::{self, Resolution},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};

// --- Response Helpers ---

/// shell_response
///
/// Renders a shell [`Resolution`]. Redirects become `303 See Other` with a `Location` header
/// so plain HTTP clients can follow them; the JSON body still carries the return-context.
pub fn shell_response(resolution: Resolution) -> Response {
    if let Resolution::Redirect { to, .. } = &resolution {
        let location = to.clone();
        return (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, location)],
            Json(resolution),
        )
            .into_response();
    }
    (StatusCode::OK, Json(resolution)).into_response()
}

/// Access guard for the data APIs. The return-context is the screen the API serves so a
/// re-login resumes there.
fn require_role(session: &Session, role: Role, screen: &str) -> Result<(), Response> {
    let screen = role.routes().route(screen);
    match guard::check(session.store.current().as_ref(), role, screen) {
        AccessDecision::Render => Ok(()),
        AccessDecision::RedirectToLogin { from } => Err(shell_response(Resolution::Redirect {
            to: LOGIN_PATH.to_string(),
            from: Some(from),
        })),
    }
}

fn require_super_admin(session: &Session) -> Result<(), Response> {
    require_role(session, Role::SuperAdministrateur, "utilisateurs")
}

fn require_administrateur(session: &Session) -> Result<(), Response> {
    require_role(session, Role::Administrateur, "configuration")
}

// --- Session Handlers ---

/// create_session
///
/// [Public Route] Starts an empty session and returns the bearer token naming it.
#[utoipa::path(
    post,
    path = "/api/session",
    responses((status = 201, description = "Session created", body = SessionCreated))
)]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), PortalError> {
    let session = state.sessions.create().await;
    let token = auth::issue_token(session.id, &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: session.id,
            token,
        }),
    ))
}

/// login
///
/// [Session Route] Login form submit. Waits the configured delay, checks the credentials
/// against the directory and stores the identity.
///
/// A failed check answers 401 with the inline message and changes nothing else.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Email ou mot de passe incorrect"),
        (status = 409, description = "Login already pending, or cancelled by navigation")
    )
)]
pub async fn login(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, PortalError> {
    let response = auth::login(
        &session,
        state.directory.as_ref(),
        payload,
        state.config.login_delay,
    )
    .await?;
    Ok(Json(response))
}

/// logout
///
/// [Session Route] Clears the identity. Any pending login is cancelled as well.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(CurrentSession(session): CurrentSession) -> StatusCode {
    session.login_gate.cancel();
    session.store.logout();
    StatusCode::NO_CONTENT
}

/// get_me
///
/// [Session Route] The identity held by the session, `null` when logged out.
#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Session identity", body = SessionInfo))
)]
pub async fn get_me(CurrentSession(session): CurrentSession) -> Json<SessionInfo> {
    Json(SessionInfo {
        identity: session.store.current(),
    })
}

// --- Navigation ---

/// navigate
///
/// [Fallback] Every `GET` outside the API is a navigation request resolved by the shell.
/// Navigating anywhere but `/login` abandons a pending login.
#[utoipa::path(
    get,
    path = "/{path}",
    params(("path" = String, Path, description = "Client-side path, e.g. administrateur/utilisateurs")),
    responses(
        (status = 200, description = "Render", body = Resolution),
        (status = 303, description = "Redirect", body = Resolution)
    )
)]
pub async fn navigate(
    method: Method,
    uri: Uri,
    session: Option<CurrentSession>,
) -> Result<Response, PortalError> {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let identity = match &session {
        Some(CurrentSession(session)) => {
            if shell::normalize(path) != LOGIN_PATH && session.login_gate.cancel() {
                tracing::info!(session_id = %session.id, path, "navigation cancelled pending login");
            }
            session.store.current()
        }
        None => None,
    };

    let resolution = shell::resolve(identity.as_ref(), path)?;
    Ok(shell_response(resolution))
}

// --- Layout Chrome ---

/// get_chrome
///
/// [Session Route] Navbar and sidebar model for the current identity. Without a supported
/// identity the shell answer (login redirect or notice) is returned instead.
#[utoipa::path(
    get,
    path = "/api/chrome",
    responses(
        (status = 200, description = "Layout", body = LayoutView),
        (status = 303, description = "Not logged in", body = Resolution)
    )
)]
pub async fn get_chrome(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Response, PortalError> {
    let Some(identity) = session.store.current() else {
        return Ok(shell_response(Resolution::Redirect {
            to: LOGIN_PATH.to_string(),
            from: None,
        }));
    };
    let Some(role) = identity.known_role() else {
        return Ok(shell_response(shell::resolve(Some(&identity), LOGIN_PATH)?));
    };

    let notifications = state.repo.list_notifications().await;
    let view: LayoutView =
        chrome::layout_view(&identity, role, &notifications, chrome::local_hour())?;
    Ok(Json(view).into_response())
}

/// select_item
///
/// [Session Route] Sidebar click. Resolves the item's route through the shell; unknown items
/// are ignored (204).
#[utoipa::path(
    post,
    path = "/api/chrome/select",
    request_body = SelectItemRequest,
    responses(
        (status = 200, description = "Render", body = Resolution),
        (status = 204, description = "Unknown item, ignored"),
        (status = 303, description = "Redirect", body = Resolution)
    )
)]
pub async fn select_item(
    CurrentSession(session): CurrentSession,
    Json(payload): Json<SelectItemRequest>,
) -> Result<Response, PortalError> {
    let identity = session.store.current();
    let Some(role) = identity.as_ref().and_then(|i| i.known_role()) else {
        return Ok(shell_response(shell::resolve(identity.as_ref(), LOGIN_PATH)?));
    };

    match chrome::select_item(role, &payload.item_id)? {
        Some(route) => Ok(shell_response(shell::resolve(identity.as_ref(), &route)?)),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// --- User Management (SuperAdministrateur) ---

/// list_users
///
/// [Management Route] All managed user accounts.
#[utoipa::path(
    get,
    path = "/api/management/users",
    responses((status = 200, description = "Users", body = [UserAccount]))
)]
pub async fn list_users(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserAccount>>, Response> {
    require_super_admin(&session)?;
    Ok(Json(state.repo.list_users().await))
}

/// create_user
///
/// [Management Route] Adds a user; the id in the payload is replaced by a fresh one.
#[utoipa::path(
    post,
    path = "/api/management/users",
    request_body = UserAccount,
    responses((status = 201, description = "Created", body = UserAccount))
)]
pub async fn create_user(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<UserAccount>,
) -> Result<(StatusCode, Json<UserAccount>), Response> {
    require_super_admin(&session)?;
    Ok((StatusCode::CREATED, Json(state.repo.add_user(payload).await)))
}

/// update_user
///
/// [Management Route] Replaces the user with `id`. An unknown id is a no-op (204).
#[utoipa::path(
    put,
    path = "/api/management/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UserAccount,
    responses(
        (status = 200, description = "Updated", body = UserAccount),
        (status = 204, description = "Unknown id, nothing changed")
    )
)]
pub async fn update_user(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UserAccount>,
) -> Result<Response, Response> {
    require_super_admin(&session)?;
    Ok(match state.repo.update_user(&id, payload).await {
        Some(user) => Json(user).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// delete_user
///
/// [Management Route] Removes the user with `id`, if present.
#[utoipa::path(
    delete,
    path = "/api/management/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 204, description = "Deleted or absent"))
)]
pub async fn delete_user(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Response> {
    require_super_admin(&session)?;
    if !state.repo.delete_user(&id).await {
        tracing::debug!(user_id = %id, "delete of unknown user ignored");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/management/roles",
    responses((status = 200, description = "Roles", body = [RoleRecord]))
)]
pub async fn list_roles(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleRecord>>, Response> {
    require_super_admin(&session)?;
    Ok(Json(state.repo.list_roles().await))
}

#[utoipa::path(
    post,
    path = "/api/management/roles",
    request_body = RoleRecord,
    responses((status = 201, description = "Created", body = RoleRecord))
)]
pub async fn create_role(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<RoleRecord>,
) -> Result<(StatusCode, Json<RoleRecord>), Response> {
    require_super_admin(&session)?;
    Ok((StatusCode::CREATED, Json(state.repo.add_role(payload).await)))
}

#[utoipa::path(
    put,
    path = "/api/management/roles/{id}",
    params(("id" = u64, Path, description = "Role ID")),
    request_body = RoleRecord,
    responses(
        (status = 200, description = "Updated", body = RoleRecord),
        (status = 204, description = "Unknown id, nothing changed")
    )
)]
pub async fn update_role(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<RoleRecord>,
) -> Result<Response, Response> {
    require_super_admin(&session)?;
    Ok(match state.repo.update_role(id, payload).await {
        Some(role) => Json(role).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// delete_role
///
/// [Management Route] Removes a role record. Users holding a copy of it keep that copy.
#[utoipa::path(
    delete,
    path = "/api/management/roles/{id}",
    params(("id" = u64, Path, description = "Role ID")),
    responses((status = 204, description = "Deleted or absent"))
)]
pub async fn delete_role(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, Response> {
    require_super_admin(&session)?;
    state.repo.delete_role(id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/management/permissions",
    responses((status = 200, description = "Permissions", body = [Permission]))
)]
pub async fn list_permissions(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Permission>>, Response> {
    require_super_admin(&session)?;
    Ok(Json(state.repo.list_permissions().await))
}

#[utoipa::path(
    post,
    path = "/api/management/permissions",
    request_body = Permission,
    responses((status = 201, description = "Created", body = Permission))
)]
pub async fn create_permission(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<Permission>,
) -> Result<(StatusCode, Json<Permission>), Response> {
    require_super_admin(&session)?;
    Ok((
        StatusCode::CREATED,
        Json(state.repo.add_permission(payload).await),
    ))
}

#[utoipa::path(
    put,
    path = "/api/management/permissions/{id}",
    params(("id" = u64, Path, description = "Permission ID")),
    request_body = Permission,
    responses(
        (status = 200, description = "Updated", body = Permission),
        (status = 204, description = "Unknown id, nothing changed")
    )
)]
pub async fn update_permission(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<Permission>,
) -> Result<Response, Response> {
    require_super_admin(&session)?;
    Ok(match state.repo.update_permission(id, payload).await {
        Some(permission) => Json(permission).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[utoipa::path(
    delete,
    path = "/api/management/permissions/{id}",
    params(("id" = u64, Path, description = "Permission ID")),
    responses((status = 204, description = "Deleted or absent"))
)]
pub async fn delete_permission(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, Response> {
    require_super_admin(&session)?;
    state.repo.delete_permission(id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// list_applications
///
/// [Management Route] Read-only reference list used by the role form.
#[utoipa::path(
    get,
    path = "/api/management/applications",
    responses((status = 200, description = "Applications", body = [Application]))
)]
pub async fn list_applications(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Application>>, Response> {
    require_super_admin(&session)?;
    Ok(Json(state.repo.list_applications().await))
}

#[utoipa::path(
    get,
    path = "/api/management/citizens",
    responses((status = 200, description = "Citizens", body = [Citizen]))
)]
pub async fn list_citizens(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Citizen>>, Response> {
    require_super_admin(&session)?;
    Ok(Json(state.repo.list_citizens().await))
}

/// get_directory
///
/// [Management Route] Directory accounts without their passwords, with active and blocked
/// counts.
#[utoipa::path(
    get,
    path = "/api/management/directory",
    responses((status = 200, description = "Directory accounts", body = DirectoryOverview))
)]
pub async fn get_directory(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<DirectoryOverview>, Response> {
    require_super_admin(&session)?;
    let records = state.directory.list_records().await;
    Ok(Json(DirectoryOverview::of(&records)))
}

/// toggle_directory_status
///
/// [Management Route] Blocks an active account or reactivates a blocked one. The status is
/// informational; it does not stop the account from logging in.
#[utoipa::path(
    post,
    path = "/api/management/directory/{id}/toggle-status",
    params(("id" = u32, Path, description = "Directory record ID")),
    responses(
        (status = 200, description = "Toggled", body = DirectoryUser),
        (status = 204, description = "Unknown id, nothing changed")
    )
)]
pub async fn toggle_directory_status(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Response, Response> {
    require_super_admin(&session)?;
    Ok(match state.directory.toggle_status(id).await {
        Some(record) => Json(DirectoryUser::from(&record)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

// --- Recette Configuration (Administrateur) ---

/// list_recettes
///
/// [Configuration Route] One page (5 rows) of the recettes on a tab, filtered by the search
/// text.
#[utoipa::path(
    get,
    path = "/api/configuration/recettes",
    params(RecetteQuery),
    responses((status = 200, description = "Recette page", body = RecettePage))
)]
pub async fn list_recettes(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Query(query): Query<RecetteQuery>,
) -> Result<Json<RecettePage>, Response> {
    require_administrateur(&session)?;
    let all = state.repo.list_recettes().await;
    Ok(Json(recettes::select(&all, &query)))
}

/// create_recette
///
/// [Configuration Route] Adds an active recette. Code, label and category are required.
#[utoipa::path(
    post,
    path = "/api/configuration/recettes",
    request_body = RecetteDraft,
    responses(
        (status = 201, description = "Created", body = Recette),
        (status = 422, description = "Veuillez remplir tous les champs obligatoires")
    )
)]
pub async fn create_recette(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<RecetteDraft>,
) -> Result<(StatusCode, Json<Recette>), Response> {
    require_administrateur(&session)?;
    recettes::validate(&payload).map_err(IntoResponse::into_response)?;
    Ok((
        StatusCode::CREATED,
        Json(state.repo.add_recette(payload).await),
    ))
}

#[utoipa::path(
    put,
    path = "/api/configuration/recettes/{id}",
    params(("id" = String, Path, description = "Recette ID")),
    request_body = RecetteDraft,
    responses(
        (status = 200, description = "Updated", body = Recette),
        (status = 204, description = "Unknown id, nothing changed"),
        (status = 422, description = "Veuillez remplir tous les champs obligatoires")
    )
)]
pub async fn update_recette(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RecetteDraft>,
) -> Result<Response, Response> {
    require_administrateur(&session)?;
    recettes::validate(&payload).map_err(IntoResponse::into_response)?;
    Ok(match state.repo.update_recette(&id, payload).await {
        Some(recette) => Json(recette).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[utoipa::path(
    delete,
    path = "/api/configuration/recettes/{id}",
    params(("id" = String, Path, description = "Recette ID")),
    responses((status = 204, description = "Deleted or absent"))
)]
pub async fn delete_recette(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Response> {
    require_administrateur(&session)?;
    if !state.repo.delete_recette(&id).await {
        tracing::debug!(recette_id = %id, "delete of unknown recette ignored");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// toggle_recette
///
/// [Configuration Route] Activates or deactivates a recette.
#[utoipa::path(
    post,
    path = "/api/configuration/recettes/{id}/toggle-active",
    params(("id" = String, Path, description = "Recette ID")),
    responses(
        (status = 200, description = "Toggled", body = Recette),
        (status = 204, description = "Unknown id, nothing changed")
    )
)]
pub async fn toggle_recette(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    require_administrateur(&session)?;
    Ok(match state.repo.toggle_recette(&id).await {
        Some(recette) => Json(recette).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
