// src/services/session_store.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::generation::ConversationHandle;

/// Result of a get-or-create lookup.
#[derive(Clone)]
pub struct StoredSession {
    pub handle: ConversationHandle,
    /// True when this call inserted the handle.
    pub created: bool,
}

/// Keyed storage for conversation handles.
///
/// `get_or_create` must be atomic per key: concurrent callers with the same
/// unseen id all receive the handle that was inserted first.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_or_create(
        &self,
        id: &str,
        create: &(dyn Fn() -> ConversationHandle + Send + Sync),
    ) -> StoredSession;

    async fn get(&self, id: &str) -> Option<ConversationHandle>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle past the configured TTL. Returns number removed.
    async fn purge_expired(&self) -> usize;
}

struct Entry {
    handle: ConversationHandle,
    /// Milliseconds since the store's epoch.
    last_active: AtomicU64,
}

/// Process-local store backed by a `HashMap`.
///
/// Unbounded by default. `with_limits` adds an idle TTL (applied by
/// `purge_expired`) and a session cap that evicts the least recently used
/// entry when a new id would exceed it.
#[derive(Clone)]
pub struct InMemorySessionStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    epoch: Instant,
    ttl: Option<Duration>,
    max_sessions: Option<usize>,
}

impl Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("ttl", &self.ttl)
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_limits(None, None)
    }

    pub fn with_limits(ttl: Option<Duration>, max_sessions: Option<usize>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            epoch: Instant::now(),
            ttl,
            max_sessions: max_sessions.filter(|&n| n > 0),
        }
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(
        &self,
        id: &str,
        create: &(dyn Fn() -> ConversationHandle + Send + Sync),
    ) -> StoredSession {
        let now = self.now_millis();
        {
            let guard = self.inner.read().await;
            if let Some(entry) = guard.get(id) {
                entry.last_active.store(now, Ordering::Relaxed);
                return StoredSession { handle: Arc::clone(&entry.handle), created: false };
            }
        }

        let mut guard = self.inner.write().await;
        // Another task may have inserted between the two locks.
        if let Some(entry) = guard.get(id) {
            entry.last_active.store(now, Ordering::Relaxed);
            return StoredSession { handle: Arc::clone(&entry.handle), created: false };
        }

        if let Some(max) = self.max_sessions {
            while guard.len() >= max {
                let oldest = guard
                    .iter()
                    .min_by_key(|(_, e)| e.last_active.load(Ordering::Relaxed))
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(key) => {
                        guard.remove(&key);
                        tracing::debug!(session_id = %key, "evicted least recently used session");
                    }
                    None => break,
                }
            }
        }

        let handle = create();
        guard.insert(
            id.to_string(),
            Entry { handle: Arc::clone(&handle), last_active: AtomicU64::new(now) },
        );
        StoredSession { handle, created: true }
    }

    async fn get(&self, id: &str) -> Option<ConversationHandle> {
        let guard = self.inner.read().await;
        guard.get(id).map(|e| Arc::clone(&e.handle))
    }

    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn purge_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let ttl = ttl.as_millis() as u64;
        let now = self.now_millis();

        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|_, e| now.saturating_sub(e.last_active.load(Ordering::Relaxed)) < ttl);
        before - guard.len()
    }
}
