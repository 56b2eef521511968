//! Turn runner
//!
//! Runs a single turn: resolves the session, opens the agent's event stream,
//! consumes events in order until the final one, and closes the stream on
//! every exit path. Failures inside the turn are contained and reported in
//! the returned `TurnOutcome`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agent::{AgentExecutor, EventStream};
use crate::core::{Content, Event, FrameworkError, FrameworkResult};
use crate::session::{SessionKey, SessionStore};

/// Result of one turn
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnOutcome {
    /// Text of the final event, if one arrived
    pub final_text: Option<String>,
    /// Every event consumed, in emission order
    pub events: Vec<Event>,
    /// Why the turn ended without a final event, if it failed
    pub error: Option<String>,
}

impl TurnOutcome {
    /// True when the turn produced non-blank final text
    pub fn has_final_text(&self) -> bool {
        self.final_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

/// Drives an agent for one (user, session) pair at a time
pub struct Runner {
    app_name: String,
    agent: Arc<dyn AgentExecutor>,
    store: Arc<SessionStore>,
    turn_timeout: Option<Duration>,
}

impl Runner {
    /// Create a runner for `agent` over `store`
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<dyn AgentExecutor>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            store,
            turn_timeout: None,
        }
    }

    /// Bound how long one turn may consume events
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    /// Application name sessions are keyed under
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The session store
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Run one turn
    ///
    /// Only a blank message is rejected with an error. Everything that goes
    /// wrong after that is reported through `TurnOutcome::error`.
    pub async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: Content,
    ) -> FrameworkResult<TurnOutcome> {
        self.run_observed(user_id, session_id, message, &mut |_| {})
            .await
    }

    /// Run one turn, handing each event to `observer` as it is consumed
    pub async fn run_observed(
        &self,
        user_id: &str,
        session_id: &str,
        message: Content,
        observer: &mut (dyn FnMut(&Event) + Send),
    ) -> FrameworkResult<TurnOutcome> {
        if message.is_blank() {
            return Err(FrameworkError::InvalidInput("message is empty".into()));
        }

        let key = SessionKey::new(&self.app_name, user_id, session_id);
        let session = self.store.create_or_get(key.clone()).await;

        tracing::info!(
            "[Runner] Turn for {} on agent '{}' ({} sessions open)",
            key,
            self.agent.name(),
            self.store.len().await
        );

        let mut outcome = TurnOutcome::default();

        let mut stream = match self.agent.run_async(session, message).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("[Runner] Failed to start agent: {:#}", e);
                outcome.error = Some(FrameworkError::stream(&e).to_string());
                return Ok(outcome);
            }
        };

        let consumed = match self.turn_timeout {
            Some(limit) => {
                let consuming = consume(stream.as_mut(), &mut outcome.events, observer);
                match tokio::time::timeout(limit, consuming).await {
                    Ok(result) => result,
                    Err(_) => Err(FrameworkError::Timeout(limit)),
                }
            }
            None => consume(stream.as_mut(), &mut outcome.events, observer).await,
        };

        if let Err(e) = stream.close().await {
            tracing::warn!("[Runner] Failed to close event stream: {:#}", e);
        }

        match consumed {
            Ok(Some(text)) => {
                tracing::info!(
                    "[Runner] Final response after {} events",
                    outcome.events.len()
                );
                outcome.final_text = Some(text);
            }
            Ok(None) => {
                tracing::warn!(
                    "[Runner] Stream ended after {} events without a final response",
                    outcome.events.len()
                );
            }
            Err(e) => {
                tracing::error!("[Runner] Turn failed: {}", e);
                outcome.error = Some(e.to_string());
            }
        }

        Ok(outcome)
    }
}

/// Pull events until the final one, recording each in order
async fn consume(
    stream: &mut dyn EventStream,
    events: &mut Vec<Event>,
    observer: &mut (dyn FnMut(&Event) + Send),
) -> FrameworkResult<Option<String>> {
    while let Some(item) = stream.next_event().await {
        let event = item.map_err(|e| FrameworkError::stream(&e))?;
        tracing::debug!("[Runner] Event: {}", event);
        observer(&event);

        // Stop at the first final event without draining the rest
        let final_text = event
            .is_final_response()
            .then(|| event.final_text().unwrap_or_default().to_string());
        events.push(event);

        if final_text.is_some() {
            return Ok(final_text);
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stream that replays a script and counts closes
    struct FakeStream {
        items: VecDeque<Result<Event>>,
        hang_after_items: bool,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl EventStream for FakeStream {
        async fn next_event(&mut self) -> Option<Result<Event>> {
            match self.items.pop_front() {
                Some(item) => Some(item),
                None if self.hang_after_items => {
                    std::future::pending::<()>().await;
                    None
                }
                None => None,
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                Err(anyhow!("close failed"))
            } else {
                Ok(())
            }
        }
    }

    struct FakeAgent {
        script: std::sync::Mutex<Option<Vec<Result<Event>>>>,
        hang_after_items: bool,
        fail_open: bool,
        fail_close: bool,
        closes: Arc<AtomicUsize>,
        sessions: std::sync::Mutex<Vec<Arc<Session>>>,
    }

    impl FakeAgent {
        fn new(script: Vec<Result<Event>>) -> Self {
            Self {
                script: std::sync::Mutex::new(Some(script)),
                hang_after_items: false,
                fail_open: false,
                fail_close: false,
                closes: Arc::new(AtomicUsize::new(0)),
                sessions: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentExecutor for FakeAgent {
        fn name(&self) -> &str {
            "fake"
        }

        async fn run_async(
            &self,
            session: Arc<Session>,
            _message: Content,
        ) -> Result<Box<dyn EventStream>> {
            self.sessions.lock().unwrap().push(session);
            if self.fail_open {
                return Err(anyhow!("MCP toolset unavailable"));
            }
            let items = self.script.lock().unwrap().take().unwrap_or_default();
            Ok(Box::new(FakeStream {
                items: items.into(),
                hang_after_items: self.hang_after_items,
                closes: self.closes.clone(),
                fail_close: self.fail_close,
            }))
        }
    }

    fn tool_call() -> Event {
        Event::tool_call("fake", "t1", "fetch", json!({}))
    }

    fn final_event(text: &str) -> Event {
        Event::final_response("fake", Content::model_text(text))
    }

    fn runner(agent: Arc<FakeAgent>) -> Runner {
        Runner::new("stock_transaction_app", agent, Arc::new(SessionStore::new()))
    }

    #[tokio::test]
    async fn test_final_text_and_ordered_log() {
        let agent = Arc::new(FakeAgent::new(vec![
            Ok(tool_call()),
            Ok(final_event("three rows")),
        ]));
        let runner = runner(agent.clone());

        let outcome = runner
            .run("user1", "s-1", Content::user_text("Fetch my stock transactions."))
            .await
            .unwrap();

        assert_eq!(outcome.final_text.as_deref(), Some("three rows"));
        assert!(outcome.error.is_none());
        assert_eq!(outcome.events.len(), 2);
        assert!(outcome.events[0].is_tool());
        assert!(outcome.events.last().unwrap().is_final_response());
        assert_eq!(agent.closes(), 1);
    }

    #[tokio::test]
    async fn test_stops_at_first_final_without_draining() {
        let agent = Arc::new(FakeAgent::new(vec![
            Ok(final_event("first")),
            Ok(tool_call()),
            Ok(final_event("second")),
        ]));
        let runner = runner(agent.clone());

        let outcome = runner
            .run("user1", "s-1", Content::user_text("hi"))
            .await
            .unwrap();

        assert_eq!(outcome.final_text.as_deref(), Some("first"));
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(agent.closes(), 1);
    }

    #[tokio::test]
    async fn test_no_final_event_yields_absent_result() {
        let agent = Arc::new(FakeAgent::new(vec![Ok(tool_call())]));
        let runner = runner(agent.clone());

        let outcome = runner
            .run("user1", "s-1", Content::user_text("hi"))
            .await
            .unwrap();

        assert!(outcome.final_text.is_none());
        assert!(outcome.error.is_none());
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(agent.closes(), 1);
    }

    #[tokio::test]
    async fn test_stream_error_is_contained() {
        let agent = Arc::new(FakeAgent::new(vec![
            Ok(tool_call()),
            Err(anyhow!("connection reset").context("Failed to call Gemini")),
            Ok(final_event("never seen")),
        ]));
        let runner = runner(agent.clone());

        let outcome = runner
            .run("user1", "s-1", Content::user_text("hi"))
            .await
            .unwrap();

        assert!(outcome.final_text.is_none());
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Stream error: Failed to call Gemini: connection reset")
        );
        assert_eq!(agent.closes(), 1);
    }

    #[tokio::test]
    async fn test_timeout_still_closes() {
        let mut agent = FakeAgent::new(vec![Ok(tool_call())]);
        agent.hang_after_items = true;
        let agent = Arc::new(agent);
        let runner = runner(agent.clone()).with_turn_timeout(Duration::from_millis(50));

        let outcome = runner
            .run("user1", "s-1", Content::user_text("hi"))
            .await
            .unwrap();

        assert!(outcome.final_text.is_none());
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.error.as_deref(), Some("Timed out after 50ms"));
        assert_eq!(agent.closes(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_contained() {
        let mut agent = FakeAgent::new(vec![]);
        agent.fail_open = true;
        let agent = Arc::new(agent);
        let runner = runner(agent.clone());

        let outcome = runner
            .run("user1", "s-1", Content::user_text("hi"))
            .await
            .unwrap();

        assert!(outcome.final_text.is_none());
        assert!(outcome.error.unwrap().contains("MCP toolset unavailable"));
        assert_eq!(agent.closes(), 0);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_result() {
        let mut agent = FakeAgent::new(vec![Ok(final_event("rows"))]);
        agent.fail_close = true;
        let agent = Arc::new(agent);
        let runner = runner(agent.clone());

        let outcome = runner
            .run("user1", "s-1", Content::user_text("hi"))
            .await
            .unwrap();

        assert_eq!(outcome.final_text.as_deref(), Some("rows"));
        assert!(outcome.error.is_none());
        assert_eq!(agent.closes(), 1);
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let agent = Arc::new(FakeAgent::new(vec![]));
        let runner = runner(agent.clone());

        let err = runner
            .run("user1", "s-1", Content::user_text("   "))
            .await
            .unwrap_err();

        assert!(matches!(err, FrameworkError::InvalidInput(_)));
        assert!(agent.sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_session_across_turns() {
        let store = Arc::new(SessionStore::new());
        let first = Arc::new(FakeAgent::new(vec![Ok(final_event("a"))]));
        let second = Arc::new(FakeAgent::new(vec![Ok(final_event("b"))]));

        Runner::new("app", first.clone(), store.clone())
            .run("user1", "s-1", Content::user_text("one"))
            .await
            .unwrap();
        Runner::new("app", second.clone(), store.clone())
            .run("user1", "s-1", Content::user_text("two"))
            .await
            .unwrap();

        let a = first.sessions.lock().unwrap()[0].clone();
        let b = second.sessions.lock().unwrap()[0].clone();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_observer_sees_events_in_order() {
        let agent = Arc::new(FakeAgent::new(vec![Ok(tool_call()), Ok(final_event("rows"))]));
        let runner = runner(agent);

        let mut seen = Vec::new();
        let outcome = runner
            .run_observed("user1", "s-1", Content::user_text("hi"), &mut |event| {
                seen.push(event.id.clone())
            })
            .await
            .unwrap();

        let logged: Vec<_> = outcome.events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(seen, logged);
    }

    #[test]
    fn test_has_final_text() {
        let mut outcome = TurnOutcome::default();
        assert!(!outcome.has_final_text());
        outcome.final_text = Some("  ".into());
        assert!(!outcome.has_final_text());
        outcome.final_text = Some("rows".into());
        assert!(outcome.has_final_text());
    }
}
