use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::roles::Role;
use crate::route_table::Page;

// --- Session Identity ---

/// Identity
///
/// The authenticated user held by a session. Created on a successful credential check,
/// cleared on logout.
///
/// `role` keeps the raw directory tag. A directory record may carry a tag outside the
/// known set, and the shell must still be able to show the "role not supported" notice for
/// it; [`Identity::known_role`] is the single place the tag is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Identity {
    pub display_name: String,
    pub role: String,
    pub avatar: Option<String>,
}

impl Identity {
    pub fn known_role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// DirectoryRecord
///
/// One entry of the externally supplied user directory. Passwords are compared in
/// plaintext; the directory is a stand-in and not a credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub id: u32,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub municipality: Option<String>,
    pub role: String,
    pub status: AccountStatus,
    pub created_on: String,
    pub display_name: String,
    pub password: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl AccountStatus {
    pub fn toggled(self) -> Self {
        match self {
            AccountStatus::Active => AccountStatus::Blocked,
            AccountStatus::Blocked => AccountStatus::Active,
        }
    }
}

/// DirectoryUser
///
/// A directory record as listed on the super-administrator's user screen. The password
/// never leaves the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DirectoryUser {
    pub id: u32,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub municipality: Option<String>,
    pub role: String,
    pub status: AccountStatus,
    pub created_on: String,
    pub display_name: String,
}

impl From<&DirectoryRecord> for DirectoryUser {
    fn from(record: &DirectoryRecord) -> Self {
        DirectoryUser {
            id: record.id,
            last_name: record.last_name.clone(),
            first_name: record.first_name.clone(),
            email: record.email.clone(),
            municipality: record.municipality.clone(),
            role: record.role.clone(),
            status: record.status,
            created_on: record.created_on.clone(),
            display_name: record.display_name.clone(),
        }
    }
}

/// DirectoryOverview
///
/// Every directory user plus the counters shown above the list.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DirectoryOverview {
    pub users: Vec<DirectoryUser>,
    pub total: usize,
    pub active: usize,
    pub blocked: usize,
}

impl DirectoryOverview {
    pub fn of(records: &[DirectoryRecord]) -> Self {
        let users: Vec<DirectoryUser> = records.iter().map(DirectoryUser::from).collect();
        let active = users
            .iter()
            .filter(|user| user.status == AccountStatus::Active)
            .count();
        DirectoryOverview {
            total: users.len(),
            active,
            blocked: users.len() - active,
            users,
        }
    }
}

impl From<&DirectoryRecord> for Identity {
    fn from(record: &DirectoryRecord) -> Self {
        Identity {
            display_name: record.display_name.clone(),
            role: record.role.clone(),
            avatar: record.avatar.clone(),
        }
    }
}

// --- Request Payloads ---

/// LoginRequest
///
/// Credentials submitted from the login form. `from` is the return-context received with
/// the redirect that brought the user to `/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "jean.rakoto@email.com")]
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// SelectItemRequest
///
/// Sidebar click forwarded by the layout chrome.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SelectItemRequest {
    pub item_id: String,
}

// --- Response Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionCreated {
    pub session_id: uuid::Uuid,
    pub token: String,
}

/// LoginResponse
///
/// `redirect_to` is where the client should navigate next: the return-context when one was
/// supplied, otherwise the role's default path (`/` for an unsupported role).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub identity: Identity,
    pub redirect_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionInfo {
    pub identity: Option<Identity>,
}

// --- Layout Chrome ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub message: String,
    pub time: String,
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SidebarItem {
    pub id: String,
    pub name: String,
    pub route: String,
    pub page: Page,
}

/// LayoutView
///
/// Everything the navbar and sidebar need to draw themselves for the current identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LayoutView {
    pub display_name: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub greeting: String,
    pub notifications: Vec<NotificationItem>,
    pub unread_count: usize,
    pub sidebar: Vec<SidebarItem>,
}

// --- User Management Schemas ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Application {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub url: String,
}

/// Citizen
///
/// Civil-registry data attached to a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Citizen {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub photo: String,
    pub national_card_number: u64,
    pub address: String,
    pub city: String,
    pub fokontany_id: u32,
    pub occupation: String,
    pub father: String,
    pub mother: String,
    pub national_card_location: String,
    pub national_card_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Permission {
    /// Assigned by the store; any value sent on create is ignored.
    #[serde(default)]
    pub id: u64,
    pub label: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleRecord {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub application: Application,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// UserAccount
///
/// A managed user as shown on the super-administrator's user screen. Roles are embedded
/// copies; deleting a role record elsewhere does not touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserAccount {
    #[serde(default)]
    pub id: String,
    pub email: String,
    pub phone: String,
    pub municipality_id: String,
    #[serde(default)]
    pub citizen: Option<Citizen>,
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
}

// --- Revenue Configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum RecetteKind {
    Fiscale,
    NonFiscale,
}

/// Recette
///
/// A revenue line (tax, fee, fine) configured by the municipality's administrator. Only
/// active lines are offered at the cash desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Recette {
    pub id: String,
    #[schema(example = "FISC-001")]
    pub code: String,
    pub label: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: RecetteKind,
    pub amount: u64,
    #[schema(example = "Mensuelle")]
    pub frequency: String,
    pub active: bool,
}

/// RecetteDraft
///
/// Create/edit form payload. The id is assigned by the store and the active flag only
/// changes through the toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecetteDraft {
    pub code: String,
    pub label: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: RecetteKind,
    pub amount: u64,
    pub frequency: String,
}

impl RecetteDraft {
    pub fn into_recette(self, id: String, active: bool) -> Recette {
        Recette {
            id,
            code: self.code,
            label: self.label,
            category: self.category,
            kind: self.kind,
            amount: self.amount,
            frequency: self.frequency,
            active,
        }
    }
}

/// RecetteQuery
///
/// Accepted query parameters for the recette listing (GET /api/configuration/recettes).
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecetteQuery {
    /// Tab filter; the fiscal tab when absent.
    #[serde(rename = "type")]
    pub kind: Option<RecetteKind>,
    /// Case-insensitive match on label, code or category.
    pub search: Option<String>,
    /// 1-based page number, clamped to the available pages.
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecettePage {
    pub items: Vec<Recette>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}
