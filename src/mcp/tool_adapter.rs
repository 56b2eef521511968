//! MCP Tool Adapter
//!
//! Adapts remote MCP tools to the crate's `Tool` trait

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::llm::{ToolDefinition, ToolInputSchema};
use crate::tools::{Tool, ToolResult};

use super::server::MCPServer;

/// Adapter that wraps an MCP tool to implement the Tool trait
pub struct MCPToolAdapter {
    /// ID of the server this tool belongs to
    server_id: String,

    /// Reference to the MCP server
    server: Arc<MCPServer>,

    /// Original tool name (used when calling MCP server)
    tool_name: String,

    /// Name the model sees, optionally namespaced
    exposed_name: String,

    /// Tool definition converted to crate format
    tool_definition: ToolDefinition,
}

impl MCPToolAdapter {
    /// Create a new MCP tool adapter
    ///
    /// With `namespaced` the tool is exposed as `server_id__tool_name`,
    /// otherwise under the server's own tool name.
    pub fn new(server: Arc<MCPServer>, rmcp_tool: rmcp::model::Tool, namespaced: bool) -> Self {
        let server_id = server.id().to_string();
        let exposed_name = Self::exposed_name(&server_id, &rmcp_tool.name, namespaced);
        let tool_definition = Self::convert_tool_definition(&exposed_name, &rmcp_tool);

        Self {
            server_id,
            server,
            tool_name: rmcp_tool.name.to_string(),
            exposed_name,
            tool_definition,
        }
    }

    /// Name the model calls the tool by
    pub fn exposed_name(server_id: &str, tool_name: &str, namespaced: bool) -> String {
        if namespaced {
            format!("{}__{}", server_id, tool_name)
        } else {
            tool_name.to_string()
        }
    }

    /// Convert rmcp Tool definition to crate ToolDefinition
    fn convert_tool_definition(name: &str, rmcp_tool: &rmcp::model::Tool) -> ToolDefinition {
        let schema_obj = rmcp_tool.input_schema.as_ref();

        let input_schema = ToolInputSchema {
            schema_type: schema_obj
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("object")
                .to_string(),
            properties: schema_obj.get("properties").cloned(),
            required: schema_obj
                .get("required")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect()
                }),
        };

        ToolDefinition {
            name: name.to_string(),
            description: rmcp_tool.description.as_ref().map(|d| d.to_string()),
            input_schema,
        }
    }

    /// Convert rmcp CallToolResult to ToolResult
    fn convert_mcp_result(rmcp_result: rmcp::model::CallToolResult) -> Result<ToolResult> {
        use rmcp::model::RawContent;

        let is_error = rmcp_result.is_error.unwrap_or(false);

        let mut text_parts = Vec::new();

        for content in &rmcp_result.content {
            match &content.raw {
                RawContent::Text(text_content) => {
                    text_parts.push(text_content.text.clone());
                }
                RawContent::Image(image_content) => {
                    text_parts.push(format!(
                        "[image: {}, {} bytes base64]",
                        image_content.mime_type,
                        image_content.data.len()
                    ));
                }
                RawContent::Resource(resource_content) => {
                    text_parts.push(serde_json::to_string_pretty(&resource_content.resource)?);
                }
                _ => {
                    text_parts.push(serde_json::to_string_pretty(content)?);
                }
            }
        }

        // Structured-only results carry no content blocks
        if text_parts.is_empty() {
            if let Some(ref structured) = rmcp_result.structured_content {
                text_parts.push(serde_json::to_string_pretty(structured)?);
            }
        }

        let output = text_parts.join("\n\n");

        if is_error {
            Ok(ToolResult::error(output))
        } else {
            Ok(ToolResult::success(output))
        }
    }
}

#[async_trait]
impl Tool for MCPToolAdapter {
    fn name(&self) -> &str {
        &self.exposed_name
    }

    fn description(&self) -> &str {
        self.tool_definition
            .description
            .as_deref()
            .unwrap_or("MCP tool (no description)")
    }

    fn definition(&self) -> ToolDefinition {
        self.tool_definition.clone()
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        tracing::info!(
            "[MCPToolAdapter] Executing '{}' on server '{}'",
            self.tool_name,
            self.server_id
        );
        tracing::debug!("[MCPToolAdapter] Input: {}", input);

        let arguments = input.as_object().cloned();

        // The server knows the tool by its original name
        let rmcp_result = self.server.call_tool(&self.tool_name, arguments).await?;
        let result = Self::convert_mcp_result(rmcp_result)?;

        tracing::debug!(
            "[MCPToolAdapter] Tool '{}' completed. Is error: {}",
            self.tool_name,
            result.is_error
        );

        Ok(result)
    }
}
