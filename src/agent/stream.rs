//! Agent event streams
//!
//! An agent hands each turn back as an `EventStream`: events arrive in
//! emission order and the consumer must `close` the stream when it is done,
//! whether it stopped at the final event, saw an error, or gave up.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::core::Event;

/// Ordered, closable sequence of events for one turn
#[async_trait]
pub trait EventStream: Send {
    /// Next event, `None` once the stream is exhausted or closed
    async fn next_event(&mut self) -> Option<Result<Event>>;

    /// Release the stream and anything it holds
    ///
    /// Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// `EventStream` over a boxed `futures` stream
///
/// Closing drops the inner stream, which cancels any model or tool call
/// still in flight.
pub struct AgentEventStream {
    agent_name: String,
    inner: Option<BoxStream<'static, Result<Event>>>,
    delivered: usize,
}

impl AgentEventStream {
    /// Wrap a stream produced by `agent_name`
    pub fn new(agent_name: impl Into<String>, inner: BoxStream<'static, Result<Event>>) -> Self {
        Self {
            agent_name: agent_name.into(),
            inner: Some(inner),
            delivered: 0,
        }
    }
}

#[async_trait]
impl EventStream for AgentEventStream {
    async fn next_event(&mut self) -> Option<Result<Event>> {
        let item = self.inner.as_mut()?.next().await;
        if matches!(item, Some(Ok(_))) {
            self.delivered += 1;
        }
        item
    }

    async fn close(&mut self) -> Result<()> {
        if self.inner.take().is_some() {
            tracing::debug!(
                "[AgentEventStream] Closed stream from '{}' after {} events",
                self.agent_name,
                self.delivered
            );
        }
        Ok(())
    }
}

impl Drop for AgentEventStream {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::warn!(
                "[AgentEventStream] Stream from '{}' dropped without close",
                self.agent_name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Content;

    fn events() -> BoxStream<'static, Result<Event>> {
        futures::stream::iter(vec![
            Ok(Event::tool_call("agent", "t1", "fetch", serde_json::json!({}))),
            Ok(Event::final_response("agent", Content::model_text("done"))),
        ])
        .boxed()
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let mut stream = AgentEventStream::new("agent", events());

        let first = stream.next_event().await.unwrap().unwrap();
        assert!(first.is_tool());
        let second = stream.next_event().await.unwrap().unwrap();
        assert!(second.is_final_response());
        assert!(stream.next_event().await.is_none());
        assert_eq!(stream.delivered, 2);

        stream.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_stops_delivery() {
        let mut stream = AgentEventStream::new("agent", events());
        stream.next_event().await.unwrap().unwrap();

        stream.close().await.unwrap();
        stream.close().await.unwrap();

        assert!(stream.inner.is_none());
        assert!(stream.next_event().await.is_none());
        assert_eq!(stream.delivered, 1);
    }
}
