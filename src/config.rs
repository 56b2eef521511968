//! Application configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded by
//! the binary first). Only the Gemini API key is required.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::core::ConfigError;
use crate::helpers::DEFAULT_SUMMARY_MODEL;
use crate::mcp::MCPServerConfig;

/// Variable holding the Gemini API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const DEFAULT_AGENT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_MCP_SERVER_URL: &str = "http://localhost:8080/mcp/stream";
const DEFAULT_MCP_SERVER_ID: &str = "fi_money";
const DEFAULT_APP_NAME: &str = "stock_transaction_app";
const DEFAULT_USER_ID: &str = "user1";
/// Address the web UI binds to when WEB_BIND is unset
pub const DEFAULT_WEB_BIND: &str = "127.0.0.1:8501";

/// Configuration for the whole application
#[derive(Clone)]
pub struct AppConfig {
    /// Gemini API key
    pub api_key: String,
    /// Model the agent runs on
    pub agent_model: String,
    /// Model the summaries come from
    pub summary_model: String,
    /// Gemini API base URL override
    pub api_base: Option<String>,
    /// Max output tokens for agent calls
    pub max_tokens: u32,
    /// Remote tool server
    pub mcp: MCPServerConfig,
    /// Upper bound on one turn
    pub turn_timeout: Duration,
    /// Application name sessions are keyed under
    pub app_name: String,
    /// User id sessions are keyed under
    pub user_id: String,
    /// Address the web UI binds to
    pub web_bind: SocketAddr,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("agent_model", &self.agent_model)
            .field("summary_model", &self.summary_model)
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .field("mcp", &self.mcp)
            .field("turn_timeout", &self.turn_timeout)
            .field("app_name", &self.app_name)
            .field("user_id", &self.user_id)
            .field("web_bind", &self.web_bind)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - GEMINI_API_KEY: Gemini API key (required)
    /// - AGENT_MODEL: agent model (default: gemini-2.0-flash)
    /// - SUMMARY_MODEL: summary model (default: gemini-1.5-pro)
    /// - GEMINI_API_BASE: API base URL (optional)
    /// - GEMINI_MAX_TOKENS: max output tokens (default: 8192)
    /// - MCP_SERVER_URL: tool server (default: http://localhost:8080/mcp/stream)
    /// - MCP_SERVER_ID: tool namespace (default: fi_money)
    /// - MCP_TIMEOUT_SECS: per-call tool timeout (default: 60)
    /// - TURN_TIMEOUT_SECS: per-turn timeout (default: 120)
    /// - APP_NAME: session application name (default: stock_transaction_app)
    /// - USER_ID: session user id (default: user1)
    /// - WEB_BIND: web UI address (default: 127.0.0.1:8501)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_VAR)
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_VAR.to_string()))?;

        let bind_str = get("WEB_BIND").unwrap_or_else(|| DEFAULT_WEB_BIND.to_string());
        let web_bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let mcp_timeout: u64 = parse_var(&get, "MCP_TIMEOUT_SECS", 60)?;
        let mcp = MCPServerConfig::new(
            get("MCP_SERVER_ID").unwrap_or_else(|| DEFAULT_MCP_SERVER_ID.to_string()),
            get("MCP_SERVER_URL").unwrap_or_else(|| DEFAULT_MCP_SERVER_URL.to_string()),
        )
        .with_call_timeout(mcp_timeout);

        Ok(Self {
            api_key,
            agent_model: get("AGENT_MODEL").unwrap_or_else(|| DEFAULT_AGENT_MODEL.to_string()),
            summary_model: get("SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            api_base: get("GEMINI_API_BASE"),
            max_tokens: parse_var(&get, "GEMINI_MAX_TOKENS", 8192)?,
            mcp,
            turn_timeout: Duration::from_secs(parse_var(&get, "TURN_TIMEOUT_SECS", 120)?),
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            user_id: get("USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            web_bind,
        })
    }
}

/// Parse a variable, falling back to `default` when unset
fn parse_var<T, F>(get: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// Tool server URL from `MCP_SERVER_URL`, readable even when the rest of
/// the configuration fails to load
pub fn mcp_server_url() -> String {
    std::env::var("MCP_SERVER_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MCP_SERVER_URL.to_string())
}

/// Directory rolling log files are written to (`LOG_DIR`, default `logs`)
pub fn log_dir() -> PathBuf {
    std::env::var("LOG_DIR")
        .ok()
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("logs"))
}
