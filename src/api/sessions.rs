//! In-memory chat sessions with a fixed capacity.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::ConversationHistory;

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct SessionEntry {
    history: Arc<Mutex<ConversationHistory>>,
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<Uuid, SessionEntry>,
    tick: u64,
}

/// Session histories keyed by id. Once `capacity` sessions exist, opening a
/// new one evicts the least recently used.
pub struct SessionStore {
    inner: RwLock<Sessions>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Sessions::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// History for `id`, opening it with `fresh` when unknown.
    pub async fn checkout<F>(&self, id: Uuid, fresh: F) -> Arc<Mutex<ConversationHistory>>
    where
        F: FnOnce() -> ConversationHistory,
    {
        let mut sessions = self.inner.write().await;
        sessions.tick += 1;
        let tick = sessions.tick;

        if let Some(entry) = sessions.entries.get_mut(&id) {
            entry.last_used = tick;
            return entry.history.clone();
        }

        while sessions.entries.len() >= self.capacity {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    sessions.entries.remove(&oldest);
                    tracing::info!("Session {} evicted (capacity {})", oldest, self.capacity);
                }
                None => break,
            }
        }

        let history = Arc::new(Mutex::new(fresh()));
        sessions.entries.insert(
            id,
            SessionEntry {
                history: history.clone(),
                last_used: tick,
            },
        );
        history
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.inner.write().await.entries.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn contains(&self, id: &Uuid) -> bool {
        self.inner.read().await.entries.contains_key(id)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn evicts_least_recently_used() {
        let store = SessionStore::new(2);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.checkout(a, ConversationHistory::default).await;
        store.checkout(b, ConversationHistory::default).await;
        store.checkout(a, ConversationHistory::default).await;
        store.checkout(c, ConversationHistory::default).await;

        assert_eq!(store.len().await, 2);
        assert!(store.contains(&a).await);
        assert!(!store.contains(&b).await);
        assert!(store.contains(&c).await);
    }

    #[tokio::test]
    async fn checkout_returns_the_same_history() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();

        store
            .checkout(id, ConversationHistory::default)
            .await
            .lock()
            .await
            .record_exchange("hi", "hello");
        let again = store.checkout(id, ConversationHistory::default).await;

        assert_eq!(again.lock().await.len(), 2);
        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
    }
}
