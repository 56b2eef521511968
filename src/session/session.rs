//! Agent session
//!
//! A `Session` is the in-process record of one conversation: its identity,
//! key/value state written by the agent, and the message history the model
//! sees on each step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{Mutex, RwLock};

use crate::llm::Message;

/// Identity of a session: (application, user, session id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    /// Application name
    pub app_name: String,
    /// User the session belongs to
    pub user_id: String,
    /// Session id, unique per conversation
    pub session_id: String,
}

impl SessionKey {
    /// Create a new session key
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// Timestamps and counters, cheap to copy out for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identity
    pub key: SessionKey,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Current key/value state
    pub state: HashMap<String, Value>,
    /// Number of messages in the history
    pub message_count: usize,
}

/// An in-process session shared by every turn of one conversation
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    created_at: DateTime<Utc>,
    state: RwLock<HashMap<String, Value>>,
    history: Mutex<Vec<Message>>,
}

impl Session {
    /// Create an empty session
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            created_at: Utc::now(),
            state: RwLock::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Session identity
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.key.session_id
    }

    /// Get the user ID
    pub fn user_id(&self) -> &str {
        &self.key.user_id
    }

    /// When the session was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Read one state value
    pub async fn get_state(&self, key: &str) -> Option<Value> {
        self.state.read().await.get(key).cloned()
    }

    /// Write one state value
    pub async fn set_state(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.write().await.insert(key.into(), value.into());
    }

    /// Copy of the whole state map
    pub async fn state(&self) -> HashMap<String, Value> {
        self.state.read().await.clone()
    }

    /// Append a message to the conversation history
    pub async fn add_message(&self, message: Message) {
        self.history.lock().await.push(message);
    }

    /// Append several messages in order
    pub async fn extend_history(&self, messages: impl IntoIterator<Item = Message>) {
        self.history.lock().await.extend(messages);
    }

    /// Copy of the conversation history
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    /// Snapshot for display and logging
    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            key: self.key.clone(),
            created_at: self.created_at,
            state: self.state().await,
            message_count: self.history.lock().await.len(),
        }
    }
}
