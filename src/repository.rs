use async_trait::async_trait;
use serde::Deserialize;
use std::{fmt, sync::Arc};
use tokio::sync::RwLock;

use crate::models::{
    Application, Citizen, NotificationItem, Permission, Recette, RecetteDraft, RoleRecord,
    UserAccount,
};

const SEED: &str = include_str!("../fixtures/management.json");

// --- Generic In-Memory Store ---

/// Record
///
/// A value that lives in a [`MockStore`] and is keyed by a store-assigned id.
///
/// Ids are derived from a monotonic sequence number, so two adds in the same instant still
/// get distinct ids.
pub trait Record: Clone + Send + Sync {
    type Id: Clone + PartialEq + fmt::Display + Send + Sync;

    fn id(&self) -> &Self::Id;
    fn set_id(&mut self, id: Self::Id);
    /// Id for the `seq`-th generated record.
    fn id_for(seq: u64) -> Self::Id;
    /// Inverse of `id_for`, used to start the sequence above seeded ids.
    fn seq_of(id: &Self::Id) -> Option<u64>;
}

impl Record for Permission {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn id_for(seq: u64) -> u64 {
        seq
    }
    fn seq_of(id: &u64) -> Option<u64> {
        Some(*id)
    }
}

impl Record for RoleRecord {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn id_for(seq: u64) -> u64 {
        seq
    }
    fn seq_of(id: &u64) -> Option<u64> {
        Some(*id)
    }
}

impl Record for UserAccount {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn id_for(seq: u64) -> String {
        format!("user-{seq}")
    }
    fn seq_of(id: &String) -> Option<u64> {
        id.strip_prefix("user-")?.parse().ok()
    }
}

impl Record for Recette {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn id_for(seq: u64) -> String {
        seq.to_string()
    }
    fn seq_of(id: &String) -> Option<u64> {
        id.parse().ok()
    }
}

/// MockStore
///
/// Ordered, in-memory collection standing in for a backend table.
///
/// * `add` assigns a fresh id and appends.
/// * `update` replaces the record with the given id, keeping that id.
/// * `delete` removes it.
///
/// Update and delete of an absent id leave the collection untouched. No cross-store
/// integrity is enforced.
#[derive(Debug, Clone)]
pub struct MockStore<T: Record> {
    items: Vec<T>,
    next_seq: u64,
}

impl<T: Record> Default for MockStore<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Record> MockStore<T> {
    pub fn new(seed: Vec<T>) -> Self {
        let next_seq = seed
            .iter()
            .filter_map(|item| T::seq_of(item.id()))
            .max()
            .map_or(1, |max| max + 1);
        Self {
            items: seed,
            next_seq,
        }
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn add(&mut self, mut item: T) -> T {
        item.set_id(T::id_for(self.next_seq));
        self.next_seq += 1;
        self.items.push(item.clone());
        item
    }

    /// Returns the stored record, or `None` when `id` is unknown (nothing changes then).
    pub fn update(&mut self, id: &T::Id, mut item: T) -> Option<T> {
        let slot = self.items.iter_mut().find(|existing| existing.id() == id)?;
        item.set_id(id.clone());
        *slot = item.clone();
        Some(item)
    }

    /// Applies `change` to the record with `id` and returns the result. The id itself cannot
    /// be changed this way.
    pub fn modify(&mut self, id: &T::Id, change: impl FnOnce(&mut T)) -> Option<T> {
        let slot = self.items.iter_mut().find(|existing| existing.id() == id)?;
        change(slot);
        slot.set_id(id.clone());
        Some(slot.clone())
    }

    /// Returns whether a record was removed.
    pub fn delete(&mut self, id: &T::Id) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }
}

// --- Repository Contract ---

/// ManagementRepository
///
/// Data access for the user-management screens, the administrator's recette configuration
/// and the navbar notification feed.
///
/// Mutations report whether they touched a record so handlers can log it; callers never turn
/// a `false`/`None` into an error.
#[async_trait]
pub trait ManagementRepository: Send + Sync {
    async fn list_users(&self) -> Vec<UserAccount>;
    async fn add_user(&self, user: UserAccount) -> UserAccount;
    async fn update_user(&self, id: &str, user: UserAccount) -> Option<UserAccount>;
    async fn delete_user(&self, id: &str) -> bool;

    async fn list_roles(&self) -> Vec<RoleRecord>;
    async fn add_role(&self, role: RoleRecord) -> RoleRecord;
    async fn update_role(&self, id: u64, role: RoleRecord) -> Option<RoleRecord>;
    async fn delete_role(&self, id: u64) -> bool;

    async fn list_permissions(&self) -> Vec<Permission>;
    async fn add_permission(&self, permission: Permission) -> Permission;
    async fn update_permission(&self, id: u64, permission: Permission) -> Option<Permission>;
    async fn delete_permission(&self, id: u64) -> bool;

    async fn list_recettes(&self) -> Vec<Recette>;
    async fn add_recette(&self, draft: RecetteDraft) -> Recette;
    /// Replaces the editable fields; the active flag is kept.
    async fn update_recette(&self, id: &str, draft: RecetteDraft) -> Option<Recette>;
    async fn delete_recette(&self, id: &str) -> bool;
    async fn toggle_recette(&self, id: &str) -> Option<Recette>;

    // Read-only reference data.
    async fn list_applications(&self) -> Vec<Application>;
    async fn list_citizens(&self) -> Vec<Citizen>;
    async fn list_notifications(&self) -> Vec<NotificationItem>;
}

/// RepositoryState
///
/// Shared handle to the management data used by the application state.
pub type RepositoryState = Arc<dyn ManagementRepository>;

#[derive(Debug, Deserialize)]
struct Seed {
    applications: Vec<Application>,
    citizens: Vec<Citizen>,
    permissions: Vec<Permission>,
    roles: Vec<RoleRecord>,
    users: Vec<UserAccount>,
    recettes: Vec<Recette>,
    notifications: Vec<NotificationItem>,
}

/// InMemoryRepository
///
/// Process-memory implementation. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    users: RwLock<MockStore<UserAccount>>,
    roles: RwLock<MockStore<RoleRecord>>,
    permissions: RwLock<MockStore<Permission>>,
    recettes: RwLock<MockStore<Recette>>,
    applications: Vec<Application>,
    citizens: Vec<Citizen>,
    notifications: Vec<NotificationItem>,
}

impl InMemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the bundled fixture data.
    pub fn seeded() -> Result<Self, serde_json::Error> {
        let seed: Seed = serde_json::from_str(SEED)?;
        Ok(Self {
            users: RwLock::new(MockStore::new(seed.users)),
            roles: RwLock::new(MockStore::new(seed.roles)),
            permissions: RwLock::new(MockStore::new(seed.permissions)),
            recettes: RwLock::new(MockStore::new(seed.recettes)),
            applications: seed.applications,
            citizens: seed.citizens,
            notifications: seed.notifications,
        })
    }
}

#[async_trait]
impl ManagementRepository for InMemoryRepository {
    async fn list_users(&self) -> Vec<UserAccount> {
        self.users.read().await.list().to_vec()
    }

    async fn add_user(&self, user: UserAccount) -> UserAccount {
        let created = self.users.write().await.add(user);
        tracing::info!(user_id = %created.id, "user added");
        created
    }

    async fn update_user(&self, id: &str, user: UserAccount) -> Option<UserAccount> {
        self.users.write().await.update(&id.to_string(), user)
    }

    async fn delete_user(&self, id: &str) -> bool {
        self.users.write().await.delete(&id.to_string())
    }

    async fn list_roles(&self) -> Vec<RoleRecord> {
        self.roles.read().await.list().to_vec()
    }

    async fn add_role(&self, role: RoleRecord) -> RoleRecord {
        let created = self.roles.write().await.add(role);
        tracing::info!(role_id = created.id, "role added");
        created
    }

    async fn update_role(&self, id: u64, role: RoleRecord) -> Option<RoleRecord> {
        self.roles.write().await.update(&id, role)
    }

    async fn delete_role(&self, id: u64) -> bool {
        // Users keep their embedded copy of the role.
        self.roles.write().await.delete(&id)
    }

    async fn list_permissions(&self) -> Vec<Permission> {
        self.permissions.read().await.list().to_vec()
    }

    async fn add_permission(&self, permission: Permission) -> Permission {
        let created = self.permissions.write().await.add(permission);
        tracing::info!(permission_id = created.id, "permission added");
        created
    }

    async fn update_permission(&self, id: u64, permission: Permission) -> Option<Permission> {
        self.permissions.write().await.update(&id, permission)
    }

    async fn delete_permission(&self, id: u64) -> bool {
        self.permissions.write().await.delete(&id)
    }

    async fn list_recettes(&self) -> Vec<Recette> {
        self.recettes.read().await.list().to_vec()
    }

    async fn add_recette(&self, draft: RecetteDraft) -> Recette {
        // New lines start active.
        let created = self
            .recettes
            .write()
            .await
            .add(draft.into_recette(String::new(), true));
        tracing::info!(recette_id = %created.id, code = %created.code, "recette added");
        created
    }

    async fn update_recette(&self, id: &str, draft: RecetteDraft) -> Option<Recette> {
        self.recettes
            .write()
            .await
            .modify(&id.to_string(), |existing| {
                *existing = draft.into_recette(existing.id.clone(), existing.active);
            })
    }

    async fn delete_recette(&self, id: &str) -> bool {
        self.recettes.write().await.delete(&id.to_string())
    }

    async fn toggle_recette(&self, id: &str) -> Option<Recette> {
        let toggled = self
            .recettes
            .write()
            .await
            .modify(&id.to_string(), |recette| recette.active = !recette.active)?;
        tracing::info!(recette_id = %toggled.id, active = toggled.active, "recette toggled");
        Some(toggled)
    }

    async fn list_applications(&self) -> Vec<Application> {
        self.applications.clone()
    }

    async fn list_citizens(&self) -> Vec<Citizen> {
        self.citizens.clone()
    }

    async fn list_notifications(&self) -> Vec<NotificationItem> {
        self.notifications.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecetteKind;

    fn permission(slug: &str) -> Permission {
        Permission {
            id: 0,
            label: slug.to_uppercase(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn back_to_back_adds_get_distinct_ids() {
        let mut store = MockStore::<Permission>::default();
        let a = store.add(permission("a"));
        let b = store.add(permission("b"));
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn sequence_starts_above_seed() {
        let mut store = MockStore::new(vec![Permission {
            id: 254,
            ..permission("delete-users")
        }]);
        assert_eq!(store.add(permission("x")).id, 255);
    }

    #[test]
    fn user_ids_keep_their_prefix() {
        assert_eq!(UserAccount::id_for(7), "user-7");
        assert_eq!(UserAccount::seq_of(&"user-12".to_string()), Some(12));
        assert_eq!(UserAccount::seq_of(&"admin".to_string()), None);
    }

    #[test]
    fn missing_ids_are_noops() {
        let mut store = MockStore::new(vec![Permission {
            id: 1,
            ..permission("a")
        }]);
        let before = store.list().to_vec();

        assert!(store.update(&99, permission("z")).is_none());
        assert!(!store.delete(&99));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn update_keeps_the_id() {
        let mut store = MockStore::new(vec![Permission {
            id: 3,
            ..permission("a")
        }]);
        let updated = store
            .update(
                &3,
                Permission {
                    id: 42,
                    ..permission("b")
                },
            )
            .unwrap();
        assert_eq!(updated.id, 3);
        assert_eq!(store.get(&3).unwrap().slug, "b");
    }

    fn draft(code: &str) -> RecetteDraft {
        RecetteDraft {
            code: code.to_string(),
            label: "Taxe de marché".to_string(),
            category: "Marchés".to_string(),
            kind: RecetteKind::Fiscale,
            amount: 2_000,
            frequency: "Journalière".to_string(),
        }
    }

    #[test]
    fn fixture_parses() {
        assert!(InMemoryRepository::seeded().is_ok());
    }

    #[tokio::test]
    async fn seeded_recettes_cover_both_kinds() {
        let repo = InMemoryRepository::seeded().unwrap();
        let recettes = repo.list_recettes().await;
        assert_eq!(recettes.len(), 8);
        assert_eq!(
            recettes
                .iter()
                .filter(|r| r.kind == RecetteKind::NonFiscale)
                .count(),
            3
        );
        assert!(!recettes.iter().find(|r| r.code == "PAT-330").unwrap().active);
    }

    #[tokio::test]
    async fn new_recettes_are_active_with_fresh_ids() {
        let repo = InMemoryRepository::seeded().unwrap();
        let created = repo.add_recette(draft("MAR-990")).await;
        assert_eq!(created.id, "9");
        assert!(created.active);
        assert_eq!(repo.list_recettes().await.len(), 9);
    }

    #[tokio::test]
    async fn edits_keep_id_and_active_flag() {
        let repo = InMemoryRepository::seeded().unwrap();

        // PAT-330 is seeded inactive.
        let updated = repo.update_recette("3", draft("PAT-331")).await.unwrap();
        assert_eq!(updated.id, "3");
        assert_eq!(updated.code, "PAT-331");
        assert!(!updated.active);

        assert!(repo.update_recette("99", draft("X")).await.is_none());
    }

    #[tokio::test]
    async fn toggle_flips_only_the_target() {
        let repo = InMemoryRepository::seeded().unwrap();

        assert!(!repo.toggle_recette("1").await.unwrap().active);
        assert!(repo.toggle_recette("1").await.unwrap().active);
        assert!(repo.toggle_recette("99").await.is_none());

        let active = repo
            .list_recettes()
            .await
            .iter()
            .filter(|r| r.active)
            .count();
        assert_eq!(active, 6);
    }

    #[tokio::test]
    async fn delete_recette_reports_removal() {
        let repo = InMemoryRepository::seeded().unwrap();
        assert!(repo.delete_recette("8").await);
        assert!(!repo.delete_recette("8").await);
        assert_eq!(repo.list_recettes().await.len(), 7);
    }
}
