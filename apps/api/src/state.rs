use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::resume::session::EditorSession;
use crate::store::{SnapshotStore, StoreError};
use crate::upstream::{CraftClient, DocumentArchive, DocumentClient};

struct LiveSession {
    session: Arc<Mutex<EditorSession>>,
    last_used: Instant,
}

/// Live editor sessions, one per user. Each sits behind its own mutex, so every
/// mutation for a user is applied in arrival order.
///
/// Every mutation is persisted before it becomes visible, so an idle session can be
/// dropped from memory and restored from its snapshot on the next request.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn SnapshotStore>,
    sessions: Arc<Mutex<HashMap<Uuid, LiveSession>>>,
    drag_throttle: Duration,
    idle_after: Duration,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        drag_throttle: Duration,
        idle_after: Duration,
    ) -> Self {
        Self {
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            drag_throttle,
            idle_after,
        }
    }

    /// Returns the live session for `user_id`, restoring it from its snapshot on first use.
    ///
    /// The registry lock is not held while the snapshot loads.
    pub async fn session(&self, user_id: Uuid) -> Result<Arc<Mutex<EditorSession>>, StoreError> {
        self.session_at(user_id, Instant::now()).await
    }

    async fn session_at(
        &self,
        user_id: Uuid,
        now: Instant,
    ) -> Result<Arc<Mutex<EditorSession>>, StoreError> {
        {
            let mut sessions = self.sessions.lock().await;
            self.evict_idle(&mut sessions, now);
            if let Some(live) = sessions.get_mut(&user_id) {
                live.last_used = now;
                return Ok(live.session.clone());
            }
        }

        let loaded = match self.store.load(user_id).await? {
            Some(snapshot) => {
                info!("Restored session for user {user_id}");
                EditorSession::from_snapshot(snapshot, self.drag_throttle)
            }
            None => {
                info!("Created new session for user {user_id}");
                EditorSession::new(self.drag_throttle)
            }
        };

        // A concurrent request may have restored the same user in the meantime.
        let mut sessions = self.sessions.lock().await;
        let live = sessions.entry(user_id).or_insert_with(|| LiveSession {
            session: Arc::new(Mutex::new(loaded)),
            last_used: now,
        });
        live.last_used = now;
        Ok(live.session.clone())
    }

    /// Drops sessions idle for longer than `idle_after` that no request is holding.
    fn evict_idle(&self, sessions: &mut HashMap<Uuid, LiveSession>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, live| {
            now.saturating_duration_since(live.last_used) < self.idle_after
                || Arc::strong_count(&live.session) > 1
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle session(s)");
        }
    }

    pub async fn persist(&self, user_id: Uuid, session: &EditorSession) -> Result<(), StoreError> {
        self.store.save(user_id, &session.to_snapshot()).await
    }

    /// Drops the live session and its snapshot.
    pub async fn reset(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.sessions.lock().await.remove(&user_id);
        self.store.delete(user_id).await
    }

    #[cfg(test)]
    async fn live_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub craft: CraftClient,
    pub documents: DocumentClient,
    /// Generated documents are archived only when S3 is configured.
    pub archive: Option<DocumentArchive>,
    pub config: Config,
}
