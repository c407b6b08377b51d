//! Snapshot Store: persists one JSON snapshot per user.
//!
//! `AppState` holds an `Arc<dyn SnapshotStore>`: Redis in production, the in-memory
//! store in tests and when no `REDIS_URL` is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::resume::snapshot::{Snapshot, SnapshotError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, user_id: Uuid) -> Result<Option<Snapshot>, StoreError>;
    async fn save(&self, user_id: Uuid, snapshot: &Snapshot) -> Result<(), StoreError>;
    async fn delete(&self, user_id: Uuid) -> Result<(), StoreError>;
}

/// Storage key of a user's snapshot.
pub fn snapshot_key(prefix: &str, user_id: Uuid) -> String {
    format!("{prefix}:{user_id}")
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisSnapshotStore {
    client: redis::Client,
    prefix: String,
}

impl RedisSnapshotStore {
    pub fn new(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<Snapshot>, StoreError> {
        let key = snapshot_key(&self.prefix, user_id);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(&key).await?;
        debug!("Loaded snapshot {key} (present: {})", raw.is_some());
        raw.map(|raw| Snapshot::from_json(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn save(&self, user_id: Uuid, snapshot: &Snapshot) -> Result<(), StoreError> {
        let key = snapshot_key(&self.prefix, user_id);
        let json = snapshot.to_json()?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(&key, json).await?;
        debug!("Saved snapshot {key}");
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), StoreError> {
        let key = snapshot_key(&self.prefix, user_id);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(&key).await?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

/// Keeps serialized snapshots in a map, so loads go through the same migration path.
#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: RwLock<HashMap<Uuid, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw JSON as-is, e.g. a legacy-shaped snapshot.
    #[cfg(test)]
    pub async fn put_raw(&self, user_id: Uuid, raw: impl Into<String>) {
        self.entries.write().await.insert(user_id, raw.into());
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<Snapshot>, StoreError> {
        let entries = self.entries.read().await;
        entries
            .get(&user_id)
            .map(|raw| Snapshot::from_json(raw))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn save(&self, user_id: Uuid, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = snapshot.to_json()?;
        self.entries.write().await.insert(user_id, json);
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::scope::ProjectScope;

    #[test]
    fn test_snapshot_key_format() {
        let id = Uuid::nil();
        assert_eq!(
            snapshot_key("resume", id),
            "resume:00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySnapshotStore::new();
        let user = Uuid::new_v4();
        assert!(store.load(user).await.unwrap().is_none());

        let snapshot = Snapshot {
            name: "Ada".to_string(),
            ..Snapshot::default()
        };
        store.save(user, &snapshot).await.unwrap();
        assert_eq!(store.load(user).await.unwrap().unwrap().name, "Ada");

        store.delete(user).await.unwrap();
        assert!(store.load(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_migrates_legacy_json() {
        let store = MemorySnapshotStore::new();
        let user = Uuid::new_v4();
        store
            .put_raw(user, r#"{"savedProjects": [{"name": "old"}]}"#)
            .await;
        let snapshot = store.load(user).await.unwrap().unwrap();
        assert_eq!(snapshot.project_store.count(ProjectScope::Established), 1);
    }

    #[tokio::test]
    async fn test_memory_store_surfaces_corrupt_json() {
        let store = MemorySnapshotStore::new();
        let user = Uuid::new_v4();
        store.put_raw(user, "not json").await;
        assert!(matches!(
            store.load(user).await,
            Err(StoreError::Snapshot(_))
        ));
    }
}
