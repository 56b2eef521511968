//! MCP Server Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the remote MCP tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPServerConfig {
    /// Unique identifier for this server
    pub id: String,

    /// URI of the MCP server (e.g., "http://localhost:8080/mcp/stream")
    pub uri: String,

    /// Whether this server is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Number of reconnection attempts on failure
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    /// Timeout for connecting and for each tool call, in seconds
    pub call_timeout_secs: Option<u64>,

    /// Prefix exposed tool names with the server id
    #[serde(default)]
    pub namespace_tools: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_reconnect_attempts() -> u32 {
    3
}

impl MCPServerConfig {
    /// Create a new MCP server configuration
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            enabled: true,
            reconnect_attempts: default_reconnect_attempts(),
            call_timeout_secs: None,
            namespace_tools: false,
        }
    }

    /// Set whether this server is enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set reconnection attempts
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Set the per-call timeout
    pub fn with_call_timeout(mut self, timeout_secs: u64) -> Self {
        self.call_timeout_secs = Some(timeout_secs);
        self
    }

    /// Set whether tool names are prefixed with the server id
    pub fn with_namespace_tools(mut self, namespace: bool) -> Self {
        self.namespace_tools = namespace;
        self
    }

    /// Get the per-call timeout as Duration
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }

    /// `host:port` of the server, for status displays
    pub fn authority(&self) -> &str {
        let rest = self
            .uri
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.uri);
        rest.split('/').next().unwrap_or(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MCPServerConfig::new("fi_money", "http://localhost:8080/mcp/stream");
        assert!(config.enabled);
        assert_eq!(config.reconnect_attempts, 3);
        assert_eq!(config.call_timeout(), None);
        assert!(!config.namespace_tools);
    }

    #[test]
    fn test_authority() {
        let config = MCPServerConfig::new("fi_money", "http://localhost:8080/mcp/stream");
        assert_eq!(config.authority(), "localhost:8080");

        let config = MCPServerConfig::new("x", "mcp.internal:9000");
        assert_eq!(config.authority(), "mcp.internal:9000");
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: MCPServerConfig =
            serde_json::from_str(r#"{"id":"fi_money","uri":"http://h/mcp"}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.reconnect_attempts, 3);
    }
}
