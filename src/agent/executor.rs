//! Agent executor seam
//!
//! `AgentExecutor` is what the runner drives: given a session and a user
//! message it opens an `EventStream` for the turn. `execute_tool` is the
//! shared tool-call step, which turns every failure into an error result the
//! model can read.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::core::Content;
use crate::session::Session;
use crate::tools::{ToolRegistry, ToolResult};

use super::stream::EventStream;

/// Something that can run one turn against a session
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Agent name, used as event author
    fn name(&self) -> &str;

    /// Open the event stream for one turn
    ///
    /// Nothing runs until the stream is polled.
    async fn run_async(
        &self,
        session: Arc<Session>,
        message: Content,
    ) -> Result<Box<dyn EventStream>>;
}

/// Execute a tool call, converting failures into error results
pub async fn execute_tool(
    tools: Option<&ToolRegistry>,
    tool_name: &str,
    tool_id: &str,
    input: &Value,
) -> ToolResult {
    let Some(tools) = tools else {
        return ToolResult::error(format!("No tools configured, cannot execute: {}", tool_name));
    };

    tracing::info!("[Executor] Executing {} ({})", tool_name, tool_id);

    match tools.execute(tool_name, input).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("[Executor] Tool {} failed: {:#}", tool_name, e);
            ToolResult::error(format!("Tool execution failed: {:#}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_registry_is_an_error_result() {
        let result = execute_tool(None, "fetch", "t1", &json!({})).await;
        assert!(result.is_error);
        assert!(result.output.contains("No tools configured"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_result() {
        let registry = ToolRegistry::new();
        let result = execute_tool(Some(&registry), "fetch", "t1", &json!({})).await;
        assert!(result.is_error);
        assert!(result.output.contains("Tool not found: fetch"));
    }
}
