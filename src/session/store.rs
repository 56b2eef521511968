//! In-process session store
//!
//! Sessions live for the lifetime of the process. Asking for the same
//! (application, user, session id) triple always yields the same `Session`.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::session::{Session, SessionKey};

/// Registry of sessions keyed by `SessionKey`
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, Arc<Session>>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `key`, creating it on first use
    pub async fn create_or_get(&self, key: SessionKey) -> Arc<Session> {
        if let Some(session) = self.sessions.read().await.get(&key) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key)
            .or_insert_with_key(|key| {
                tracing::info!("[SessionStore] Created session {}", key);
                Arc::new(Session::new(key.clone()))
            })
            .clone()
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
