//! LLM Provider trait
//!
//! Abstracts the model interface so the agent loop and the summary client
//! can be driven by Gemini in production and by fakes in tests.

use anyhow::Result;
use std::sync::Arc;

use super::types::{Message, MessageResponse, SystemPrompt, ToolChoice, ToolDefinition};

/// Trait for LLM providers used by `LlmAgent` and `SummaryClient`.
///
/// All providers work with the same internal message types. Providers that
/// use a different wire format handle translation internally.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a simple message and get a text response (no tool calling).
    ///
    /// Used by `SummaryClient` and other single-shot calls.
    async fn send_message(
        &self,
        user_message: &str,
        conversation_history: &[Message],
        system_prompt: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String>;

    /// Send a request with tools and system prompt, returning the full response.
    ///
    /// This is the method used by the agent loop for each model step.
    async fn send_with_tools_and_system(
        &self,
        messages: Vec<Message>,
        system: Option<SystemPrompt>,
        tools: Vec<ToolDefinition>,
        tool_choice: Option<ToolChoice>,
        session_id: Option<&str>,
    ) -> Result<MessageResponse>;

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "gemini").
    fn provider_name(&self) -> &str;

    /// Create a variant of this provider with a different model and max tokens,
    /// sharing the same credentials.
    fn create_variant(&self, model: &str, max_tokens: u32) -> Arc<dyn LlmProvider>;
}
