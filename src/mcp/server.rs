//! MCP Server wrapper
//!
//! Wraps an rmcp client service connected to one remote MCP server over
//! streamable HTTP. Every operation checks liveness first and reconnects
//! when the connection is gone or a call fails.

use anyhow::{anyhow, Context, Result};
use rmcp::model::{CallToolRequestParams, CallToolResult, ListToolsResult, Tool};
use rmcp::service::RunningService;
use rmcp::transport::{
    streamable_http_client::StreamableHttpClientTransportConfig, StreamableHttpClientTransport,
};
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::config::MCPServerConfig;

/// The concrete transport type we use for HTTP MCP connections
pub type HttpClientTransport = StreamableHttpClientTransport<reqwest::Client>;

type ClientService = RunningService<RoleClient, ()>;

/// Wrapper around an rmcp service connection
pub struct MCPServer {
    /// Unique identifier for this server
    id: String,

    /// URI of the server, used for reconnection
    uri: String,

    /// The underlying rmcp service (None if not connected)
    service: Arc<RwLock<Option<ClientService>>>,

    /// How many times to try reconnecting before giving up
    reconnect_attempts: u32,

    /// Deadline for connecting and for each call
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for MCPServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MCPServer")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .field("reconnect_attempts", &self.reconnect_attempts)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl MCPServer {
    /// Connect to an MCP server
    pub async fn new(config: MCPServerConfig) -> Result<Self> {
        let server = Self {
            id: config.id.clone(),
            uri: config.uri.clone(),
            service: Arc::new(RwLock::new(None)),
            reconnect_attempts: config.reconnect_attempts,
            call_timeout: config.call_timeout(),
        };

        tracing::info!("[MCPServer] Connecting to '{}' at {}", server.id, server.uri);

        let service = server.create_service().await?;
        *server.service.write().await = Some(service);

        tracing::info!("[MCPServer] Connected to '{}'", server.id);
        Ok(server)
    }

    /// Create an rmcp service connection
    async fn create_service(&self) -> Result<ClientService> {
        let transport_config = StreamableHttpClientTransportConfig::with_uri(self.uri.as_str());
        let transport: HttpClientTransport = HttpClientTransport::from_config(transport_config);

        self.with_timeout("connect", async {
            ().serve(transport)
                .await
                .with_context(|| format!("Failed to connect to MCP server at {}", self.uri))
        })
        .await
    }

    /// Run a future under the configured call timeout
    async fn with_timeout<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                anyhow!(
                    "MCP {} on '{}' timed out after {:?}",
                    what,
                    self.id,
                    limit
                )
            })?,
            None => fut.await,
        }
    }

    /// Get the server ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the server URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Check if the server is connected
    pub async fn is_connected(&self) -> bool {
        self.service.read().await.is_some()
    }

    /// Reconnect to the server once
    pub async fn reconnect(&self) -> Result<()> {
        tracing::info!("[MCPServer] Reconnecting to '{}'", self.id);

        let mut service_guard = self.service.write().await;

        // Drop old connection
        *service_guard = None;

        let service = self.create_service().await?;
        *service_guard = Some(service);

        tracing::info!("[MCPServer] Successfully reconnected to '{}'", self.id);
        Ok(())
    }

    /// Reconnect, retrying up to the configured number of attempts
    async fn reconnect_with_retries(&self) -> Result<()> {
        let attempts = self.reconnect_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.reconnect().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        "[MCPServer] Reconnect attempt {}/{} to '{}' failed: {:#}",
                        attempt,
                        attempts,
                        self.id,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("no reconnect attempts made"))
            .context(format!(
                "MCP server '{}' unreachable after {} attempts",
                self.id, attempts
            )))
    }

    /// Make sure a connection exists, reconnecting if it was dropped
    pub async fn ensure_connected(&self) -> Result<()> {
        if self.is_connected().await {
            return Ok(());
        }
        self.reconnect_with_retries().await
    }

    async fn try_list_tools(&self) -> Result<Vec<Tool>> {
        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| anyhow!("MCP server '{}' is not connected", self.id))?;

        let result: ListToolsResult = self
            .with_timeout("list_tools", async {
                service
                    .list_tools(Default::default())
                    .await
                    .with_context(|| format!("Failed to list tools on '{}'", self.id))
            })
            .await?;

        Ok(result.tools)
    }

    /// List all tools available on this server
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_connected().await?;

        tracing::debug!("[MCPServer] Listing tools from '{}'", self.id);

        let tools = match self.try_list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                tracing::warn!("[MCPServer] list_tools on '{}' failed: {:#}", self.id, e);
                self.reconnect_with_retries().await?;
                self.try_list_tools().await?
            }
        };

        tracing::info!("[MCPServer] Got {} tools from '{}'", tools.len(), self.id);

        Ok(tools)
    }

    async fn try_call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult> {
        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| anyhow!("MCP server '{}' is not connected", self.id))?;

        self.with_timeout("call_tool", async {
            service
                .call_tool(CallToolRequestParams {
                    meta: None,
                    name: name.to_string().into(),
                    arguments,
                    task: None,
                })
                .await
                .with_context(|| format!("MCP tool '{}' failed on '{}'", name, self.id))
        })
        .await
    }

    /// Call a tool on this server
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult> {
        self.ensure_connected().await?;

        tracing::info!("[MCPServer] Calling tool '{}' on server '{}'", name, self.id);
        tracing::debug!("[MCPServer] Arguments: {:?}", arguments);

        let result = match self.try_call_tool(name, arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("[MCPServer] Call to '{}' failed: {:#}", name, e);
                self.reconnect_with_retries().await?;
                self.try_call_tool(name, arguments).await?
            }
        };

        tracing::debug!("[MCPServer] Tool call completed for '{}'", name);

        Ok(result)
    }

    /// Health check - try to list tools to verify connection
    pub async fn health_check(&self) -> Result<()> {
        self.try_list_tools().await?;
        Ok(())
    }
}
