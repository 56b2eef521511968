//! Shared state for the web UI
//!
//! Holds the components built once at startup, the status captured at that
//! moment, and the conversations opened through the UI. Each conversation
//! sits behind its own mutex so turns on one session never overlap.
//!
//! At most `max_conversations` are kept; opening one past the limit forgets
//! the oldest, so a turn posted without a `conversation_id` cannot grow the
//! map forever.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::app::{ComponentStatus, Components, ConversationContext};

/// One conversation opened through the UI
#[derive(Debug)]
pub struct ConversationState {
    /// Session identity used for every turn
    pub context: ConversationContext,
    /// Most recent raw final answer, offered for download
    pub last_final_text: Option<String>,
}

/// Default cap on conversations held by the UI
pub const MAX_CONVERSATIONS: usize = 64;

#[derive(Default)]
struct Conversations {
    by_id: HashMap<String, Arc<Mutex<ConversationState>>>,
    // Oldest first
    order: VecDeque<String>,
}

/// Shared application state accessible by all handlers
pub struct AppState {
    components: Option<Arc<Components>>,
    init_status: ComponentStatus,
    conversations: RwLock<Conversations>,
    max_conversations: usize,
}

/// Arc-wrapped state used with axum's `State` extractor
pub type SharedState = Arc<AppState>;

impl AppState {
    /// State over initialized components
    pub async fn initialized(components: Arc<Components>) -> Self {
        let init_status = components.status().await;
        Self {
            components: Some(components),
            init_status,
            conversations: RwLock::default(),
            max_conversations: MAX_CONVERSATIONS,
        }
    }

    /// State after a failed startup; the UI only shows the error
    pub fn failed(init_status: ComponentStatus) -> Self {
        Self {
            components: None,
            init_status,
            conversations: RwLock::default(),
            max_conversations: MAX_CONVERSATIONS,
        }
    }

    /// Keep at most `max` conversations (at least one)
    pub fn with_max_conversations(mut self, max: usize) -> Self {
        self.max_conversations = max.max(1);
        self
    }

    /// Components, when startup succeeded
    pub fn components(&self) -> Option<&Arc<Components>> {
        self.components.as_ref()
    }

    /// Current status, refreshed when components exist
    pub async fn status(&self) -> ComponentStatus {
        match self.components {
            Some(ref components) => components.status().await,
            None => self.init_status.clone(),
        }
    }

    /// Open a conversation with a fresh session id
    ///
    /// Returns `None` when the components never initialized.
    pub async fn open_conversation(&self) -> Option<(String, Arc<Mutex<ConversationState>>)> {
        let components = self.components.as_ref()?;
        let context = components.new_conversation();
        components.open_session(&context).await;

        let id = context.session_id.clone();
        let conversation = Arc::new(Mutex::new(ConversationState {
            context,
            last_final_text: None,
        }));

        {
            let mut conversations = self.conversations.write().await;
            while conversations.order.len() >= self.max_conversations {
                let Some(oldest) = conversations.order.pop_front() else {
                    break;
                };
                conversations.by_id.remove(&oldest);
                tracing::info!("[Web] Forgot conversation {}", oldest);
            }
            conversations.order.push_back(id.clone());
            conversations.by_id.insert(id.clone(), conversation.clone());
        }

        tracing::info!(
            "[Web] Opened conversation {} ({} open)",
            id,
            self.conversation_count().await
        );

        Some((id, conversation))
    }

    /// Look up a conversation by id
    pub async fn conversation(&self, id: &str) -> Option<Arc<Mutex<ConversationState>>> {
        self.conversations.read().await.by_id.get(id).cloned()
    }

    /// Number of open conversations
    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.by_id.len()
    }
}
