//! LLM agent loop
//!
//! The agent that handles one turn as:
//! user message → LLM → tools → LLM → ... → final answer
//!
//! Each step is emitted as an `Event` on a lazily-polled stream. Model text
//! that accompanies tool calls, the tool calls and their results are
//! intermediate; the answer without tool calls is the single final event.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;

use crate::core::{Content, Event, IntermediateEvent};
use crate::llm::{ContentBlock, LlmProvider, Message, StopReason, SystemPrompt};
use crate::session::Session;

use super::config::AgentConfig;
use super::executor::{execute_tool, AgentExecutor};
use super::stream::{AgentEventStream, EventStream};

/// Agent that answers with an LLM and remote tools
///
/// # Example
///
/// ```ignore
/// let config = AgentConfig::stock_transactions("gemini-2.0-flash").with_tools(tools);
/// let agent = LlmAgent::new(config, llm);
///
/// let mut stream = agent.run_async(session, Content::user_text("Fetch my stock transactions.")).await?;
/// while let Some(event) = stream.next_event().await {
///     println!("{}", event?);
/// }
/// stream.close().await?;
/// ```
pub struct LlmAgent {
    config: Arc<AgentConfig>,
    llm: Arc<dyn LlmProvider>,
}

impl LlmAgent {
    /// Create a new agent
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            config: Arc::new(config),
            llm,
        }
    }

    /// Agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

#[async_trait]
impl AgentExecutor for LlmAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn run_async(
        &self,
        session: Arc<Session>,
        message: Content,
    ) -> Result<Box<dyn EventStream>> {
        let config = self.config.clone();
        let llm = self.llm.clone();

        tracing::info!(
            "[LlmAgent] '{}' starting turn for session {}",
            config.name,
            session.key()
        );

        let events = try_stream! {
            session.add_message(Message::user(message.text())).await;

            let tool_definitions = config.tool_definitions();
            let system = Some(SystemPrompt::Text(config.system_prompt()));
            let mut iterations = 0;

            loop {
                iterations += 1;
                if iterations > config.max_tool_iterations {
                    tracing::warn!(
                        "[LlmAgent] Max tool iterations ({}) reached",
                        config.max_tool_iterations
                    );
                    Err::<(), _>(anyhow!(
                        "Max tool iterations ({}) reached without a final answer",
                        config.max_tool_iterations
                    ))?;
                }

                let messages = session.history().await;

                tracing::info!(
                    "[LlmAgent] Calling LLM with {} messages (iteration {})",
                    messages.len(),
                    iterations
                );

                let response = llm
                    .send_with_tools_and_system(
                        messages,
                        system.clone(),
                        tool_definitions.clone(),
                        None,
                        Some(session.session_id()),
                    )
                    .await?;

                tracing::info!(
                    "[LlmAgent] LLM response: stop_reason={:?}",
                    response.stop_reason
                );

                if !response.has_tool_use() {
                    match response.stop_reason {
                        Some(StopReason::MaxTokens) => {
                            tracing::warn!("[LlmAgent] Response truncated (max tokens)");
                        }
                        Some(StopReason::Refusal) => {
                            tracing::warn!("[LlmAgent] Model refused to respond");
                        }
                        _ => {}
                    }

                    let text = response.text();
                    session
                        .add_message(Message::assistant_with_blocks(response.content))
                        .await;

                    // State is written before the final event is handed out
                    if let Some(ref key) = config.output_key {
                        session.set_state(key.clone(), text.clone()).await;
                    }

                    yield Event::final_response(&config.name, Content::model_text(text));
                    break;
                }

                for block in &response.content {
                    match block {
                        ContentBlock::Text { text } if !text.is_empty() => {
                            yield Event::intermediate(
                                &config.name,
                                IntermediateEvent::ModelText { text: text.clone() },
                            );
                        }
                        ContentBlock::ToolUse { id, name, input } => {
                            tracing::info!("[LlmAgent] Tool use: {} ({})", name, id);
                            yield Event::tool_call(&config.name, id, name, input.clone());
                        }
                        _ => {}
                    }
                }

                let tool_uses: Vec<(String, String, serde_json::Value)> = response
                    .tool_uses()
                    .into_iter()
                    .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                    .collect();

                // Committed together with the results so a turn dropped mid-tool
                // never leaves a tool call without its response in history
                let tool_use_message = Message::assistant_with_blocks(response.content);

                let mut result_blocks = Vec::with_capacity(tool_uses.len());
                for (id, name, input) in tool_uses {
                    let result = execute_tool(config.tools.as_deref(), &name, &id, &input).await;
                    yield Event::tool_response(
                        &config.name,
                        &id,
                        &name,
                        result.output.clone(),
                        result.is_error,
                    );
                    result_blocks.push(ContentBlock::tool_result(&id, &result.output, result.is_error));
                }

                session
                    .extend_history([tool_use_message, Message::user_with_blocks(result_blocks)])
                    .await;
            }
        };

        Ok(Box::new(AgentEventStream::new(
            self.config.name.clone(),
            events.boxed(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventKind;
    use crate::llm::{MessageResponse, ToolChoice, ToolDefinition, ToolInputSchema, Usage};
    use crate::session::SessionKey;
    use crate::tools::{Tool, ToolRegistry, ToolResult};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays canned responses
    struct ScriptedLlm {
        responses: Mutex<VecDeque<Result<MessageResponse>>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<MessageResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn send_message(
            &self,
            _user_message: &str,
            _conversation_history: &[Message],
            _system_prompt: Option<&str>,
            _session_id: Option<&str>,
        ) -> Result<String> {
            unreachable!("agent only uses tool-aware calls")
        }

        async fn send_with_tools_and_system(
            &self,
            messages: Vec<Message>,
            _system: Option<SystemPrompt>,
            _tools: Vec<ToolDefinition>,
            _tool_choice: Option<ToolChoice>,
            _session_id: Option<&str>,
        ) -> Result<MessageResponse> {
            self.requests.lock().unwrap().push(messages);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no scripted response left")))
        }

        fn model(&self) -> String {
            "scripted".into()
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn create_variant(&self, _model: &str, _max_tokens: u32) -> Arc<dyn LlmProvider> {
            unreachable!()
        }
    }

    struct FetchTool;

    #[async_trait]
    impl Tool for FetchTool {
        fn name(&self) -> &str {
            "fetch_stock_transactions"
        }

        fn description(&self) -> &str {
            "Fetch stock transactions"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name().to_string(),
                description: Some(self.description().to_string()),
                input_schema: ToolInputSchema::new(),
            }
        }

        async fn execute(&self, _input: &Value) -> Result<ToolResult> {
            Ok(ToolResult::success(r#"[{"isin":"INE002A01018","type":"Buy"}]"#))
        }
    }

    /// Tool that never finishes in test time
    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Takes too long"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name().to_string(),
                description: Some(self.description().to_string()),
                input_schema: ToolInputSchema::new(),
            }
        }

        async fn execute(&self, _input: &Value) -> Result<ToolResult> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(ToolResult::success("late"))
        }
    }

    fn response(content: Vec<ContentBlock>) -> Result<MessageResponse> {
        Ok(MessageResponse {
            id: "r".into(),
            content,
            model: "scripted".into(),
            stop_reason: None,
            usage: Usage::default(),
        })
    }

    fn agent(llm: Arc<ScriptedLlm>) -> LlmAgent {
        let mut registry = ToolRegistry::new();
        registry.register(FetchTool);
        LlmAgent::new(
            AgentConfig::stock_transactions("scripted").with_tools(Arc::new(registry)),
            llm,
        )
    }

    async fn collect(stream: &mut Box<dyn EventStream>) -> (Vec<Event>, Option<anyhow::Error>) {
        let mut events = Vec::new();
        while let Some(item) = stream.next_event().await {
            match item {
                Ok(event) => events.push(event),
                Err(e) => return (events, Some(e)),
            }
        }
        (events, None)
    }

    fn session() -> Arc<Session> {
        Arc::new(Session::new(SessionKey::new("app", "user1", "s-1")))
    }

    #[tokio::test]
    async fn test_tool_round_then_final() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            response(vec![
                ContentBlock::text("Fetching."),
                ContentBlock::tool_use("t1", "fetch_stock_transactions", json!({})),
            ]),
            response(vec![ContentBlock::text("ISIN INE002A01018 Buy")]),
        ]));
        let agent = agent(llm.clone());
        let session = session();

        let mut stream = agent
            .run_async(session.clone(), Content::user_text("Fetch my stock transactions."))
            .await
            .unwrap();
        let (events, error) = collect(&mut stream).await;
        stream.close().await.unwrap();

        assert!(error.is_none());
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0].kind,
            EventKind::Intermediate { event: IntermediateEvent::ModelText { text } } if text == "Fetching."
        ));
        assert!(events[1].is_tool());
        assert!(matches!(
            &events[2].kind,
            EventKind::Intermediate { event: IntermediateEvent::ToolResponse { is_error: false, output, .. } }
                if output.contains("INE002A01018")
        ));
        assert_eq!(events[3].final_text(), Some("ISIN INE002A01018 Buy"));
        assert!(events.iter().all(|e| e.author == "fetch_stock_transactions_agent"));

        assert_eq!(
            session.get_state("last_result").await,
            Some(json!("ISIN INE002A01018 Buy"))
        );
        // user, assistant tool call, tool result, assistant answer
        assert_eq!(session.history().await.len(), 4);
        // the second request carried the tool result
        assert_eq!(llm.requests.lock().unwrap()[1].len(), 3);
    }

    #[tokio::test]
    async fn test_llm_failure_surfaces_as_stream_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(anyhow!("Gemini API error (500)"))]));
        let agent = agent(llm);

        let mut stream = agent
            .run_async(session(), Content::user_text("hi"))
            .await
            .unwrap();
        let (events, error) = collect(&mut stream).await;
        stream.close().await.unwrap();

        assert!(events.is_empty());
        assert!(error.unwrap().to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            response(vec![ContentBlock::tool_use("t1", "missing_tool", json!({}))]),
            response(vec![ContentBlock::text("Sorry, no data.")]),
        ]));
        let agent = agent(llm);

        let mut stream = agent
            .run_async(session(), Content::user_text("hi"))
            .await
            .unwrap();
        let (events, error) = collect(&mut stream).await;
        stream.close().await.unwrap();

        assert!(error.is_none());
        assert!(matches!(
            &events[1].kind,
            EventKind::Intermediate { event: IntermediateEvent::ToolResponse { is_error: true, .. } }
        ));
        assert_eq!(events.last().unwrap().final_text(), Some("Sorry, no data."));
    }

    #[tokio::test]
    async fn test_iteration_limit_ends_with_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            response(vec![ContentBlock::tool_use("t1", "fetch_stock_transactions", json!({}))]),
            response(vec![ContentBlock::tool_use("t2", "fetch_stock_transactions", json!({}))]),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(FetchTool);
        let agent = LlmAgent::new(
            AgentConfig::new("loop", "scripted")
                .with_tools(Arc::new(registry))
                .with_max_tool_iterations(2),
            llm,
        );

        let mut stream = agent
            .run_async(session(), Content::user_text("hi"))
            .await
            .unwrap();
        let (events, error) = collect(&mut stream).await;
        stream.close().await.unwrap();

        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| !e.is_final_response()));
        assert!(error.unwrap().to_string().contains("Max tool iterations (2)"));
    }

    #[tokio::test]
    async fn test_close_during_tool_keeps_history_paired() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            response(vec![ContentBlock::tool_use("t1", "slow", json!({}))]),
            response(vec![ContentBlock::text("Done.")]),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(SlowTool);
        let agent = LlmAgent::new(
            AgentConfig::stock_transactions("scripted").with_tools(Arc::new(registry)),
            llm.clone(),
        );
        let session = session();

        let mut stream = agent
            .run_async(session.clone(), Content::user_text("first"))
            .await
            .unwrap();
        let call = stream.next_event().await.unwrap().unwrap();
        assert!(call.is_tool());
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(100), stream.next_event()).await;
        assert!(pending.is_err());
        stream.close().await.unwrap();

        // only the user message survives the abandoned tool round
        assert_eq!(session.history().await.len(), 1);

        let mut stream = agent
            .run_async(session.clone(), Content::user_text("second"))
            .await
            .unwrap();
        let (events, error) = collect(&mut stream).await;
        stream.close().await.unwrap();

        assert!(error.is_none());
        assert_eq!(events.last().unwrap().final_text(), Some("Done."));

        let requests = llm.requests.lock().unwrap();
        let unpaired = requests[1].iter().any(|message| {
            message
                .blocks()
                .is_some_and(|blocks| blocks.iter().any(|b| b.as_tool_use().is_some()))
        });
        assert!(!unpaired);
        assert_eq!(requests[1].len(), 2);
    }

    #[tokio::test]
    async fn test_nothing_runs_until_polled() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let agent = agent(llm.clone());
        let session = session();

        let mut stream = agent
            .run_async(session.clone(), Content::user_text("hi"))
            .await
            .unwrap();
        stream.close().await.unwrap();

        assert!(llm.requests.lock().unwrap().is_empty());
        assert!(session.history().await.is_empty());
    }
}
