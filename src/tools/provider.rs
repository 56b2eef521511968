//! Tool Provider trait
//!
//! Abstraction for dynamic tool sources such as a remote MCP server.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::tool::Tool;

/// Trait for dynamic tool providers
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Get all tools from this provider
    ///
    /// Called once when the provider is added to a registry.
    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &str;
}
