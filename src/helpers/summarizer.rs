//! Summary helper
//!
//! Asks a second model for short insights on the agent's final answer. The
//! prompt is a fixed instruction, a single space, then the answer verbatim.
//!
//! # Example
//!
//! ```ignore
//! let summary = SummaryClient::new(llm.as_ref(), "gemini-1.5-pro");
//! let insights = summary.summarize(&final_text).await?;
//! ```

use anyhow::Result;
use std::sync::Arc;

use crate::llm::LlmProvider;

/// Default model for summaries
pub const DEFAULT_SUMMARY_MODEL: &str = "gemini-1.5-pro";

/// Instruction placed in front of the text to summarize
pub const SUMMARY_INSTRUCTION: &str = "Analyze the response and provide insights only in 200 words.";

/// Maximum tokens for the summary response
const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Helper for summarizing a final answer
pub struct SummaryClient {
    llm: Arc<dyn LlmProvider>,
}

impl SummaryClient {
    /// Create a summary client sharing credentials with `llm`
    pub fn new(llm: &dyn LlmProvider, model: &str) -> Self {
        Self {
            llm: llm.create_variant(model, SUMMARY_MAX_TOKENS),
        }
    }

    /// Use `llm` exactly as given
    pub fn with_provider(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Model the summaries come from
    pub fn model(&self) -> String {
        self.llm.model()
    }

    /// Build the summary prompt for `text`
    pub fn build_prompt(text: &str) -> String {
        format!("{} {}", SUMMARY_INSTRUCTION, text)
    }

    /// Summarize `text`, returning the model's reply unmodified
    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot summarize an empty response");
        }

        tracing::debug!(
            "[SummaryClient] Summarizing {} chars with {}",
            text.len(),
            self.llm.model()
        );

        let summary = self
            .llm
            .send_message(&Self::build_prompt(text), &[], None, None)
            .await?;

        if summary.trim().is_empty() {
            anyhow::bail!("Summary model returned no text");
        }

        tracing::info!("[SummaryClient] Generated summary ({} chars)", summary.len());

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, MessageResponse, SystemPrompt, ToolChoice, ToolDefinition};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingLlm {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn send_message(
            &self,
            user_message: &str,
            _conversation_history: &[Message],
            _system_prompt: Option<&str>,
            _session_id: Option<&str>,
        ) -> Result<String> {
            self.prompts.lock().unwrap().push(user_message.to_string());
            Ok(self.reply.clone())
        }

        async fn send_with_tools_and_system(
            &self,
            _messages: Vec<Message>,
            _system: Option<SystemPrompt>,
            _tools: Vec<ToolDefinition>,
            _tool_choice: Option<ToolChoice>,
            _session_id: Option<&str>,
        ) -> Result<MessageResponse> {
            unreachable!("summaries never use tools")
        }

        fn model(&self) -> String {
            "recording".into()
        }

        fn provider_name(&self) -> &str {
            "recording"
        }

        fn create_variant(&self, _model: &str, _max_tokens: u32) -> Arc<dyn LlmProvider> {
            unreachable!()
        }
    }

    fn client(reply: &str) -> (SummaryClient, Arc<RecordingLlm>) {
        let llm = Arc::new(RecordingLlm {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        (SummaryClient::with_provider(llm.clone()), llm)
    }

    #[test]
    fn test_build_prompt() {
        assert_eq!(
            SummaryClient::build_prompt("ISIN INE002A01018 Buy"),
            "Analyze the response and provide insights only in 200 words. ISIN INE002A01018 Buy"
        );
    }

    #[tokio::test]
    async fn test_summary_is_returned_unmodified() {
        let (summary, llm) = client("  Mostly buys.\n");

        let result = summary.summarize("three rows").await.unwrap();
        assert_eq!(result, "  Mostly buys.\n");
        assert_eq!(
            llm.prompts.lock().unwrap().as_slice(),
            ["Analyze the response and provide insights only in 200 words. three rows"]
        );
    }

    #[tokio::test]
    async fn test_blank_input_is_not_sent() {
        let (summary, llm) = client("anything");

        assert!(summary.summarize("  ").await.is_err());
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_reply_is_an_error() {
        let (summary, _llm) = client("   ");
        let err = summary.summarize("rows").await.unwrap_err();
        assert!(err.to_string().contains("no text"));
    }
}
