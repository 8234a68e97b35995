use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{config::DEFAULT_SESSION_TTL, error::PortalError, models::Identity};

/// SessionStore
///
/// Holds the identity of one client session. `login` replaces whatever was there, `logout`
/// clears it, and both publish the new value to every subscriber.
///
/// The store performs no validation; the credential check happens before `login` is called.
/// None of its operations can fail: "no identity" is an ordinary state.
#[derive(Debug)]
pub struct SessionStore {
    identity: watch::Sender<Option<Identity>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self { identity }
    }

    pub fn login(&self, identity: Identity) {
        tracing::info!(role = %identity.role, user = %identity.display_name, "session login");
        self.identity.send_replace(Some(identity));
    }

    pub fn logout(&self) {
        if let Some(previous) = self.identity.send_replace(None) {
            tracing::info!(user = %previous.display_name, "session logout");
        }
    }

    pub fn current(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Observers see every identity change after the point of subscription.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}

/// LoginAttempt
///
/// Proof that a login submit was admitted by the [`LoginGate`]. Its result may only be
/// applied if [`LoginAttempt::finish`] returns `true`. Dropping an unfinished attempt (for
/// instance when the request future is abandoned) releases the gate.
#[derive(Debug)]
#[must_use]
pub struct LoginAttempt<'a> {
    gate: &'a LoginGate,
    generation: u64,
    finished: bool,
}

impl LoginAttempt<'_> {
    /// Closes the attempt. `true` means no cancellation happened since it began.
    pub fn finish(mut self) -> bool {
        self.finished = true;
        if self.gate.generation.load(Ordering::Acquire) != self.generation {
            return false;
        }
        self.gate
            .pending
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Drop for LoginAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished && self.gate.generation.load(Ordering::Acquire) == self.generation {
            self.gate.pending.store(false, Ordering::Release);
        }
    }
}

/// LoginGate
///
/// Serializes login submits for one session. While an attempt is pending a second submit is
/// refused, and navigating away bumps the generation so the pending attempt's result is
/// discarded when it arrives.
#[derive(Debug, Default)]
pub struct LoginGate {
    pending: AtomicBool,
    generation: AtomicU64,
}

impl LoginGate {
    /// # Errors
    /// [`PortalError::LoginInProgress`] if an attempt is already pending.
    pub fn begin(&self) -> Result<LoginAttempt<'_>, PortalError> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PortalError::LoginInProgress)?;
        Ok(LoginAttempt {
            gate: self,
            generation: self.generation.load(Ordering::Acquire),
            finished: false,
        })
    }

    /// Discards the pending attempt, if any. Returns whether something was cancelled.
    pub fn cancel(&self) -> bool {
        if !self.pending.load(Ordering::Acquire) {
            return false;
        }
        // Bump first: a `finish` racing with us must see a stale generation.
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pending.store(false, Ordering::Release);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Session
///
/// The per-client context object: identity plus its login gate. A session lives until
/// `expires_at`, the same instant its token stops validating.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub store: SessionStore,
    pub login_gate: LoginGate,
    /// `None` when the TTL is too large to represent; such a session never expires.
    pub expires_at: Option<Instant>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl Session {
    pub fn new(ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            store: SessionStore::new(),
            login_gate: LoginGate::default(),
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// SessionRegistry
///
/// Maps session ids to live sessions. One registry is built at application start and shared
/// through `AppState`; tests build their own to stay isolated.
///
/// Expired sessions are unreachable through `get` and are dropped on every `create` and by
/// [`SessionRegistry::prune`], which `main` runs periodically.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    ttl: Duration,
}

/// Shared handle stored in the application state.
pub type SessionState = Arc<SessionRegistry>;

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Starts an empty (unauthenticated) session.
    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(self.ttl));
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, existing| !existing.is_expired());
        sessions.insert(session.id, session.clone());
        tracing::debug!(session_id = %session.id, live = sessions.len(), "session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|session| !session.is_expired())
            .cloned()
    }

    /// Drops every expired session. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, live = sessions.len(), "expired sessions pruned");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: &str) -> Identity {
        Identity {
            display_name: "Rakoto Jean".to_string(),
            role: role.to_string(),
            avatar: None,
        }
    }

    #[test]
    fn login_replaces_and_logout_clears() {
        let store = SessionStore::new();
        assert_eq!(store.current(), None);

        store.login(identity("Administrateur"));
        store.login(identity("Maire"));
        assert_eq!(store.current().unwrap().role, "Maire");

        store.logout();
        assert_eq!(store.current(), None);
        // Logging out twice is harmless.
        store.logout();
        assert_eq!(store.current(), None);
    }

    #[tokio::test]
    async fn observers_are_signalled() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        store.login(identity("Caissier"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().role, "Caissier");

        store.logout();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn gate_refuses_reentrant_submit() {
        let gate = LoginGate::default();
        let attempt = gate.begin().unwrap();
        assert!(matches!(gate.begin(), Err(PortalError::LoginInProgress)));
        assert!(attempt.finish());
        assert!(!gate.is_pending());
        let _next = gate.begin().unwrap();
    }

    #[test]
    fn cancelled_attempt_is_stale() {
        let gate = LoginGate::default();
        let attempt = gate.begin().unwrap();
        assert!(gate.cancel());
        assert!(!attempt.finish());
        assert!(!gate.is_pending());
        assert!(!gate.cancel());
    }

    #[test]
    fn dropped_attempt_releases_the_gate() {
        let gate = LoginGate::default();
        drop(gate.begin().unwrap());
        assert!(!gate.is_pending());
        assert!(gate.begin().is_ok());
    }

    #[tokio::test]
    async fn registry_sessions_are_isolated() {
        let registry = SessionRegistry::default();
        let a = registry.create().await;
        let b = registry.create().await;
        a.store.login(identity("Maire"));

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(b.id).await.unwrap().store.current().is_none());
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_unreachable_and_pruned() {
        let registry = SessionRegistry::new(Duration::from_millis(20));
        let old = registry.create().await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(old.is_expired());
        assert!(registry.get(old.id).await.is_none());
        assert_eq!(registry.prune().await, 1);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn create_drops_expired_sessions() {
        let registry = SessionRegistry::new(Duration::from_millis(20));
        for _ in 0..100 {
            registry.create().await;
        }
        tokio::time::sleep(Duration::from_millis(40)).await;

        let fresh = registry.create().await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(fresh.id).await.is_some());
    }

    #[test]
    fn oversized_ttl_never_expires() {
        let session = Session::new(Duration::MAX);
        assert!(session.expires_at.is_none());
        assert!(!session.is_expired());
    }
}
