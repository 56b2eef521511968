//! Gemini API client
//!
//! This module provides a direct HTTP client for the Google Gemini API,
//! translating between the crate's internal message types and the Gemini
//! `generateContent` wire format.
//!
//! # Authentication
//!
//! Uses a Gemini API key, sent as the `x-goog-api-key` header.
//!
//! ```ignore
//! let llm = GeminiProvider::new(api_key)?
//!     .with_model("gemini-2.0-flash")
//!     .with_max_tokens(8192);
//! ```

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::provider::LlmProvider;
use super::types::{
    ContentBlock, Message, MessageContent, MessageResponse, StopReason, SystemPrompt, ToolChoice,
    ToolDefinition, Usage,
};

/// Public Gemini REST endpoint
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// Gemini-specific request/response types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolConfig {
    function_calling_config: GeminiFunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionCallingConfig {
    mode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

// Response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsageMetadata>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    thoughts_token_count: Option<u32>,
}

// ============================================================================
// GeminiProvider
// ============================================================================

/// Google Gemini LLM provider
///
/// Translates between the crate's internal message types and the Gemini API
/// format. Translation happens only at this boundary.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    api_base: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider with a specific API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Self::build_client(DEFAULT_REQUEST_TIMEOUT)?,
            api_key: api_key.into(),
            model: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    fn build_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Gemini")
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the API base URL (proxies, test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Self::build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Get the API base URL
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    // ========================================================================
    // Format conversion: Internal -> Gemini
    // ========================================================================

    /// Convert internal messages to Gemini format
    fn convert_messages(&self, messages: &[Message]) -> Vec<GeminiContent> {
        // functionResponse parts are matched by name, so collect every
        // tool_use id across the history first
        let tool_use_names: HashMap<&str, &str> = messages
            .iter()
            .filter_map(|m| m.blocks())
            .flatten()
            .filter_map(|b| b.as_tool_use().map(|(id, name, _)| (id, name)))
            .collect();

        let mut gemini_contents: Vec<GeminiContent> = Vec::new();

        for msg in messages {
            let gemini_role = match msg.role.as_str() {
                "assistant" => "model",
                _ => "user",
            };

            let parts = Self::convert_content_to_parts(&msg.content, &tool_use_names);
            if parts.is_empty() {
                continue;
            }

            // Function responses always travel as "user" content
            let has_function_response = parts.iter().any(|p| p.function_response.is_some());
            if has_function_response && parts.iter().any(|p| p.function_response.is_none()) {
                let (fn_parts, other_parts): (Vec<GeminiPart>, Vec<GeminiPart>) = parts
                    .into_iter()
                    .partition(|p| p.function_response.is_some());

                if !other_parts.is_empty() {
                    gemini_contents.push(GeminiContent {
                        role: gemini_role.to_string(),
                        parts: other_parts,
                    });
                }
                gemini_contents.push(GeminiContent {
                    role: "user".to_string(),
                    parts: fn_parts,
                });
            } else {
                let role = if has_function_response { "user" } else { gemini_role };
                gemini_contents.push(GeminiContent {
                    role: role.to_string(),
                    parts,
                });
            }
        }

        // Gemini requires alternating user/model turns
        Self::merge_consecutive_roles(gemini_contents)
    }

    /// Merge consecutive messages with the same role
    fn merge_consecutive_roles(contents: Vec<GeminiContent>) -> Vec<GeminiContent> {
        let mut merged: Vec<GeminiContent> = Vec::new();

        for content in contents {
            if let Some(last) = merged.last_mut() {
                if last.role == content.role {
                    last.parts.extend(content.parts);
                    continue;
                }
            }
            merged.push(content);
        }

        merged
    }

    /// Convert internal content to Gemini parts
    fn convert_content_to_parts(
        content: &MessageContent,
        tool_use_names: &HashMap<&str, &str>,
    ) -> Vec<GeminiPart> {
        match content {
            MessageContent::Text(text) => vec![GeminiPart {
                text: Some(text.clone()),
                ..Default::default()
            }],
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } if text.is_empty() => None,
                    ContentBlock::Text { text } => Some(GeminiPart {
                        text: Some(text.clone()),
                        ..Default::default()
                    }),
                    ContentBlock::ToolUse { name, input, .. } => Some(GeminiPart {
                        function_call: Some(GeminiFunctionCall {
                            name: name.clone(),
                            args: input.clone(),
                        }),
                        ..Default::default()
                    }),
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => {
                        let name = tool_use_names
                            .get(tool_use_id.as_str())
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| tool_use_id.clone());
                        let output = content.clone().unwrap_or_else(|| "No output".to_string());
                        let response = if is_error.unwrap_or(false) {
                            serde_json::json!({ "error": output })
                        } else {
                            serde_json::json!({ "result": output })
                        };
                        Some(GeminiPart {
                            function_response: Some(GeminiFunctionResponse { name, response }),
                            ..Default::default()
                        })
                    }
                })
                .collect(),
        }
    }

    /// Convert internal tool definitions to Gemini function declarations
    fn convert_tools(tools: &[ToolDefinition]) -> Option<Vec<GeminiTool>> {
        if tools.is_empty() {
            return None;
        }

        let declarations = tools
            .iter()
            .map(|tool| {
                let parameters = if tool.input_schema.properties.is_some()
                    || tool.input_schema.required.is_some()
                {
                    let mut params = serde_json::json!({
                        "type": tool.input_schema.schema_type,
                    });
                    if let Some(ref props) = tool.input_schema.properties {
                        params["properties"] = Self::clean_schema_for_gemini(props);
                    }
                    if let Some(ref req) = tool.input_schema.required {
                        params["required"] = serde_json::json!(req);
                    }
                    Some(params)
                } else {
                    None
                };

                GeminiFunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone().unwrap_or_default(),
                    parameters,
                }
            })
            .collect();

        Some(vec![GeminiTool {
            function_declarations: declarations,
        }])
    }

    /// Strip JSON Schema keywords Gemini's function declarations reject
    fn clean_schema_for_gemini(value: &Value) -> Value {
        const UNSUPPORTED_FIELDS: &[&str] = &[
            "additionalProperties",
            "$schema",
            "definitions",
            "$ref",
            "patternProperties",
            "if",
            "then",
            "else",
            "allOf",
            "anyOf",
            "oneOf",
            "not",
            "default",
        ];

        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| !UNSUPPORTED_FIELDS.contains(&key.as_str()))
                    .map(|(key, val)| (key.clone(), Self::clean_schema_for_gemini(val)))
                    .collect(),
            ),
            Value::Array(arr) => {
                Value::Array(arr.iter().map(Self::clean_schema_for_gemini).collect())
            }
            other => other.clone(),
        }
    }

    /// Convert system prompt to Gemini format
    fn convert_system_prompt(system: &Option<SystemPrompt>) -> Option<GeminiSystemInstruction> {
        let texts: Vec<String> = match system {
            Some(SystemPrompt::Text(text)) => vec![text.clone()],
            Some(SystemPrompt::Blocks(blocks)) => blocks.iter().map(|b| b.text.clone()).collect(),
            None => return None,
        };

        Some(GeminiSystemInstruction {
            parts: texts
                .into_iter()
                .map(|text| GeminiPart {
                    text: Some(text),
                    ..Default::default()
                })
                .collect(),
        })
    }

    /// Convert tool choice to Gemini format
    fn convert_tool_config(tool_choice: &Option<ToolChoice>) -> GeminiToolConfig {
        let mode = match tool_choice {
            Some(ToolChoice::Auto) | None => "AUTO",
            Some(ToolChoice::Any) => "ANY",
            Some(ToolChoice::None) => "NONE",
        };

        GeminiToolConfig {
            function_calling_config: GeminiFunctionCallingConfig {
                mode: mode.to_string(),
            },
        }
    }

    // ========================================================================
    // Format conversion: Gemini -> Internal
    // ========================================================================

    /// Convert Gemini response to internal MessageResponse format
    fn convert_response(&self, gemini_resp: GeminiResponse) -> Result<MessageResponse> {
        let candidate = gemini_resp
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .context("No candidates in Gemini response")?;

        let content_blocks = Self::convert_gemini_parts_to_blocks(
            candidate
                .content
                .as_ref()
                .map(|c| &c.parts[..])
                .unwrap_or(&[]),
        );

        let stop_reason = if content_blocks
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
        {
            Some(StopReason::ToolUse)
        } else {
            candidate.finish_reason.as_deref().map(|r| match r {
                "MAX_TOKENS" => StopReason::MaxTokens,
                "SAFETY" | "RECITATION" => StopReason::Refusal,
                _ => StopReason::EndTurn,
            })
        };

        let usage = gemini_resp
            .usage_metadata
            .as_ref()
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                thoughts_token_count: u.thoughts_token_count,
            })
            .unwrap_or_default();

        Ok(MessageResponse {
            id: gemini_resp
                .response_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            content: content_blocks,
            model: gemini_resp
                .model_version
                .unwrap_or_else(|| self.model.clone()),
            stop_reason,
            usage,
        })
    }

    /// Convert Gemini parts to internal ContentBlocks
    fn convert_gemini_parts_to_blocks(parts: &[GeminiPart]) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();

        for part in parts {
            if let Some(ref text) = part.text {
                // Thought summaries are not part of the answer
                if part.thought != Some(true) && !text.is_empty() {
                    blocks.push(ContentBlock::text(text.clone()));
                }
            }

            if let Some(ref fc) = part.function_call {
                let tool_id = format!("gemini_tool_{}", uuid::Uuid::new_v4().simple());
                blocks.push(ContentBlock::tool_use(tool_id, fc.name.clone(), fc.args.clone()));
            }
        }

        blocks
    }

    // ========================================================================
    // API methods
    // ========================================================================

    /// Build the API URL for a given operation
    fn api_url(&self, operation: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, self.model, operation)
    }

    /// Send a non-streaming request to the Gemini API
    async fn send_gemini_request(
        &self,
        request: &GeminiRequest,
        session_id: Option<&str>,
    ) -> Result<GeminiResponse> {
        let url = self.api_url("generateContent");

        let request_json =
            serde_json::to_string(request).context("Failed to serialize Gemini request")?;
        tracing::debug!("[Gemini] Request JSON: {}", request_json);

        let mut request_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key);

        if let Some(sid) = session_id {
            request_builder = request_builder.header("X-Agent-Session-Id", sid);
        }

        let response = request_builder
            .body(request_json)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Gemini response body")?;

        tracing::debug!("[Gemini] Response status: {}", status);
        tracing::debug!("[Gemini] Response body: {}", response_text);

        if !status.is_success() {
            tracing::error!("[Gemini] API error: {} - {}", status, response_text);
            anyhow::bail!("Gemini API error ({}): {}", status, response_text);
        }

        serde_json::from_str(&response_text).context("Failed to parse Gemini API response")
    }

    /// Build a GeminiRequest from internal types
    fn build_request(
        &self,
        messages: &[Message],
        system: &Option<SystemPrompt>,
        tools: &[ToolDefinition],
        tool_choice: &Option<ToolChoice>,
    ) -> GeminiRequest {
        let gemini_tools = Self::convert_tools(tools);
        let tool_config = gemini_tools
            .as_ref()
            .map(|_| Self::convert_tool_config(tool_choice));

        GeminiRequest {
            contents: self.convert_messages(messages),
            system_instruction: Self::convert_system_prompt(system),
            tools: gemini_tools,
            tool_config,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: Some(self.max_tokens),
                temperature: Some(1.0),
            }),
        }
    }
}

// ============================================================================
// LlmProvider implementation
// ============================================================================

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn send_message(
        &self,
        user_message: &str,
        conversation_history: &[Message],
        system_prompt: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String> {
        tracing::info!("[Gemini] Sending message to {}", self.model);

        let mut messages: Vec<Message> = conversation_history.to_vec();
        messages.push(Message::user(user_message));

        let system = system_prompt.map(|s| SystemPrompt::Text(s.to_string()));
        let request = self.build_request(&messages, &system, &[], &None);

        let gemini_response = self.send_gemini_request(&request, session_id).await?;
        let response = self.convert_response(gemini_response)?;

        Ok(response.text())
    }

    async fn send_with_tools_and_system(
        &self,
        messages: Vec<Message>,
        system: Option<SystemPrompt>,
        tools: Vec<ToolDefinition>,
        tool_choice: Option<ToolChoice>,
        session_id: Option<&str>,
    ) -> Result<MessageResponse> {
        tracing::info!("[Gemini] Sending message with tools to {}", self.model);
        tracing::debug!("[Gemini] Messages count: {}", messages.len());
        tracing::debug!("[Gemini] Tools count: {}", tools.len());

        let request = self.build_request(&messages, &system, &tools, &tool_choice);
        let gemini_response = self.send_gemini_request(&request, session_id).await?;
        self.convert_response(gemini_response)
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn create_variant(&self, model: &str, max_tokens: u32) -> Arc<dyn LlmProvider> {
        Arc::new(Self {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
            max_tokens,
            api_base: self.api_base.clone(),
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ToolInputSchema;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base: &str) -> GeminiProvider {
        GeminiProvider::new("test-key")
            .unwrap()
            .with_model("gemini-2.0-flash")
            .with_api_base(base)
    }

    #[test]
    fn test_tool_result_maps_to_function_response_across_messages() {
        let llm = provider(DEFAULT_API_BASE);
        let messages = vec![
            Message::user("Fetch my stock transactions."),
            Message::assistant_with_blocks(vec![ContentBlock::tool_use(
                "gemini_tool_a",
                "fetch_stock_transactions",
                json!({}),
            )]),
            Message::user_with_blocks(vec![ContentBlock::tool_result(
                "gemini_tool_a",
                "[]",
                false,
            )]),
        ];

        let contents = llm.convert_messages(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");

        let response = contents[2].parts[0].function_response.as_ref().unwrap();
        assert_eq!(response.name, "fetch_stock_transactions");
        assert_eq!(response.response, json!({ "result": "[]" }));
    }

    #[test]
    fn test_consecutive_user_messages_are_merged() {
        let llm = provider(DEFAULT_API_BASE);
        let contents = llm.convert_messages(&[Message::user("one"), Message::user("two")]);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].parts.len(), 2);
    }

    #[test]
    fn test_clean_schema_strips_unsupported_fields() {
        let cleaned = GeminiProvider::clean_schema_for_gemini(&json!({
            "account": { "type": "string", "default": "all", "$schema": "x" },
            "additionalProperties": false
        }));
        assert_eq!(cleaned, json!({ "account": { "type": "string" } }));
    }

    #[test]
    fn test_convert_tools_declares_parameters() {
        let tools = vec![ToolDefinition {
            name: "fetch".into(),
            description: Some("Fetch rows".into()),
            input_schema: ToolInputSchema::new()
                .with_properties(json!({ "limit": { "type": "integer" } }))
                .with_required(vec!["limit".into()]),
        }];

        let converted = GeminiProvider::convert_tools(&tools).unwrap();
        let decl = &converted[0].function_declarations[0];
        assert_eq!(decl.name, "fetch");
        assert_eq!(decl.parameters.as_ref().unwrap()["required"], json!(["limit"]));
        assert!(GeminiProvider::convert_tools(&[]).is_none());
    }

    #[tokio::test]
    async fn test_send_message_posts_prompt_and_reads_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("Hello Gemini"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Hi there" }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 3, "candidatesTokenCount": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let llm = provider(&server.uri());
        let text = llm.send_message("Hello Gemini", &[], None, None).await.unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_function_call_becomes_tool_use() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [
                        { "functionCall": { "name": "fetch", "args": { "limit": 3 } } }
                    ]},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let llm = provider(&server.uri());
        let response = llm
            .send_with_tools_and_system(vec![Message::user("go")], None, vec![], None, None)
            .await
            .unwrap();

        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        let uses = response.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].1, "fetch");
        assert_eq!(uses[0].2, &json!({ "limit": 3 }));
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let llm = provider(&server.uri());
        let err = llm.send_message("hi", &[], None, None).await.unwrap_err();
        let shown = format!("{:#}", err);
        assert!(shown.contains("403"));
        assert!(shown.contains("API key not valid"));
    }
}
