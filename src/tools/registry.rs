//! Tool registry for managing available tools
//!
//! The registry holds all tools that are available to the agent. Tools are
//! either registered directly or pulled from providers (the MCP connector).

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use super::provider::ToolProvider;
use super::tool::{Tool, ToolResult};
use crate::llm::ToolDefinition;

/// Registry that holds all available tools
pub struct ToolRegistry {
    /// Tools keyed by exposed name
    tools: BTreeMap<String, Arc<dyn Tool>>,

    /// Providers the tools were pulled from
    providers: Vec<Arc<dyn ToolProvider>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            providers: Vec::new(),
        }
    }

    /// Register a static tool in the registry
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool in the registry
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        tracing::info!("[ToolRegistry] Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Add a tool provider
    ///
    /// Fetches all tools from the provider immediately. Returns an error if
    /// any tool name conflicts with an existing tool.
    pub async fn add_provider(&mut self, provider: Arc<dyn ToolProvider>) -> Result<()> {
        tracing::info!("[ToolRegistry] Adding provider '{}'", provider.name());

        let tools = provider.get_tools().await?;

        for tool in tools {
            let name = tool.name().to_string();

            if self.tools.contains_key(&name) {
                return Err(anyhow::anyhow!(
                    "Tool name conflict: '{}' already exists (from provider '{}')",
                    name,
                    provider.name()
                ));
            }

            tracing::info!(
                "[ToolRegistry] Registering tool '{}' from provider '{}'",
                name,
                provider.name()
            );
            self.tools.insert(name, tool);
        }

        self.providers.push(provider);

        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool definitions, ordered by name
    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, input: &Value) -> Result<ToolResult> {
        let tool = self
            .tools
            .get(name)
            .with_context(|| format!("Tool not found: {}", name))?;

        tracing::info!("[ToolRegistry] Executing tool: {}", name);
        tracing::debug!("[ToolRegistry] Input: {:?}", input);

        let result = tool.execute(input).await?;

        tracing::debug!(
            "[ToolRegistry] Tool {} completed. Is error: {}",
            name,
            result.is_error
        );

        Ok(result)
    }

    /// Get the list of tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Names of the providers tools were pulled from
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
