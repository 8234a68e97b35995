use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::DirectoryRecord;

const SEED: &str = include_str!("../fixtures/directory.json");

/// UserDirectory
///
/// The credential-check boundary: given an email and password, find the matching record.
/// It also backs the super-administrator's user list, where accounts are blocked and
/// unblocked. Implementations are swapped behind `Arc<dyn UserDirectory>` so tests can
/// supply their own directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_credentials(&self, email: &str, password: &str) -> Option<DirectoryRecord>;

    async fn list_records(&self) -> Vec<DirectoryRecord>;

    /// Flips the record between active and blocked. `None` for an unknown id.
    async fn toggle_status(&self, id: u32) -> Option<DirectoryRecord>;
}

pub type DirectoryState = Arc<dyn UserDirectory>;

/// InMemoryDirectory
///
/// Linear scan over a fixed record list with plaintext comparison. Exists for behavioural
/// parity with the mock-data front-end and must not be mistaken for a credential store.
/// Account status is not consulted at login, matching that front-end.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    records: RwLock<Vec<DirectoryRecord>>,
}

impl InMemoryDirectory {
    pub fn new(records: Vec<DirectoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// The bundled fixture directory.
    pub fn seeded() -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(SEED)?))
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_credentials(&self, email: &str, password: &str) -> Option<DirectoryRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.email == email && record.password == password)
            .cloned()
    }

    async fn list_records(&self) -> Vec<DirectoryRecord> {
        self.records.read().await.clone()
    }

    async fn toggle_status(&self, id: u32) -> Option<DirectoryRecord> {
        let mut records = self.records.write().await;
        let record = records.iter_mut().find(|record| record.id == id)?;
        record.status = record.status.toggled();
        tracing::info!(user_id = id, status = ?record.status, "directory status changed");
        Some(record.clone())
    }
}
