//! Remote tool connector
//!
//! Owns the single MCP connection used by the agent and exposes the remote
//! tool list as `Tool` trait objects through `ToolProvider`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::tools::{Tool, ToolProvider};

use super::config::MCPServerConfig;
use super::server::MCPServer;
use super::tool_adapter::MCPToolAdapter;

/// Connection to the remote tool endpoint
pub struct ToolConnector {
    config: MCPServerConfig,
    server: Arc<MCPServer>,
}

impl ToolConnector {
    /// Open the connection described by `config`
    pub async fn connect(config: MCPServerConfig) -> Result<Self> {
        if !config.enabled {
            anyhow::bail!("MCP server '{}' is disabled", config.id);
        }

        let server = MCPServer::new(config.clone())
            .await
            .with_context(|| format!("Failed to open MCP toolset '{}'", config.id))?;

        Ok(Self {
            config,
            server: Arc::new(server),
        })
    }

    /// Server configuration
    pub fn config(&self) -> &MCPServerConfig {
        &self.config
    }

    /// Shared handle to the underlying server
    pub fn server(&self) -> Arc<MCPServer> {
        self.server.clone()
    }

    /// Check the connection, reconnecting if it does not answer
    pub async fn ensure_live(&self) -> Result<()> {
        if self.server.health_check().await.is_ok() {
            return Ok(());
        }
        tracing::warn!(
            "[ToolConnector] '{}' failed liveness check, reconnecting",
            self.config.id
        );
        self.server.list_tools().await.map(|_| ())
    }
}

#[async_trait]
impl ToolProvider for ToolConnector {
    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        tracing::info!("[ToolConnector] Fetching tools from '{}'", self.config.id);

        let tools: Vec<Arc<dyn Tool>> = self
            .server
            .list_tools()
            .await?
            .into_iter()
            .map(|tool| {
                let adapter =
                    MCPToolAdapter::new(self.server.clone(), tool, self.config.namespace_tools);
                Arc::new(adapter) as Arc<dyn Tool>
            })
            .collect();

        tracing::info!(
            "[ToolConnector] Created {} tool adapters from '{}'",
            tools.len(),
            self.config.id
        );

        Ok(tools)
    }

    fn name(&self) -> &str {
        &self.config.id
    }
}
