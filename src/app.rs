//! Application wiring
//!
//! `Components` holds everything a presentation layer needs for a turn: the
//! runner over the stock transactions agent, the summary client and the
//! remote tool connection. Both the console and the web UI build one at
//! startup and reuse it for every turn.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::agent::{AgentConfig, LlmAgent};
use crate::config::AppConfig;
use crate::core::{Content, Event, FrameworkError, FrameworkResult};
use crate::helpers::SummaryClient;
use crate::llm::{GeminiProvider, LlmProvider};
use crate::mcp::ToolConnector;
use crate::runner::Runner;
use crate::session::{SessionKey, SessionSnapshot, SessionStore};
use crate::tools::ToolRegistry;

/// Shown when a turn produced no summary
pub const NO_INSIGHTS: &str = "No insights available";

/// Identity of one logical conversation
///
/// Every conversation gets its own session id, so sessions never collide
/// between users of the same process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationContext {
    /// User the conversation belongs to
    pub user_id: String,
    /// Fresh session id
    pub session_id: String,
    /// When the conversation started
    pub started_at: DateTime<Utc>,
}

impl ConversationContext {
    /// Start a conversation for `user_id` with a fresh session id
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
        }
    }
}

/// Everything produced by one turn, ready for display
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnReport {
    /// Raw final response from the agent
    pub final_text: Option<String>,
    /// Summary of the final response
    pub insights: Option<String>,
    /// Events in emission order
    pub events: Vec<Event>,
    /// Why the turn produced no final response
    pub error: Option<String>,
    /// Why the summary is missing, when it was requested
    pub insights_error: Option<String>,
}

impl TurnReport {
    /// Summary text, or the placeholder when there is none
    pub fn insights_or_placeholder(&self) -> &str {
        self.insights.as_deref().unwrap_or(NO_INSIGHTS)
    }
}

/// Startup status shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    /// Whether the components are ready for turns
    pub initialized: bool,
    /// Whether the Gemini API key was found
    pub credential_found: bool,
    /// `host:port` of the tool server
    pub mcp_server: String,
    /// Whether the tool server connection is open
    pub mcp_connected: bool,
    /// Agent name
    pub agent_name: Option<String>,
    /// Agent model
    pub agent_model: Option<String>,
    /// Summary model
    pub summary_model: Option<String>,
    /// Tools the agent can call
    pub tools: Vec<String>,
    /// Startup error, if initialization failed
    pub error: Option<String>,
}

impl ComponentStatus {
    /// Status for a failed startup
    pub fn failed(error: &FrameworkError, mcp_server: impl Into<String>) -> Self {
        Self {
            initialized: false,
            credential_found: !matches!(
                error,
                FrameworkError::Config(crate::core::ConfigError::MissingCredential(_))
            ),
            mcp_server: mcp_server.into(),
            mcp_connected: false,
            agent_name: None,
            agent_model: None,
            summary_model: None,
            tools: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Initialized agent, runner and summary client
pub struct Components {
    config: AppConfig,
    runner: Runner,
    agent_name: String,
    summary: SummaryClient,
    connector: Option<Arc<ToolConnector>>,
    tool_names: Vec<String>,
}

impl Components {
    /// Connect to Gemini and the tool server and build the agent
    pub async fn initialize(config: AppConfig) -> FrameworkResult<Self> {
        tracing::info!("[Components] Initializing with {:?}", config);

        let mut llm = GeminiProvider::new(config.api_key.clone())
            .map_err(|e| FrameworkError::other(format!("{:#}", e)))?
            .with_model(config.agent_model.clone())
            .with_max_tokens(config.max_tokens);
        if let Some(ref base) = config.api_base {
            llm = llm.with_api_base(base.clone());
        }
        let llm = llm
            .with_timeout(config.turn_timeout)
            .map_err(|e| FrameworkError::other(format!("{:#}", e)))?;

        let connector = Arc::new(
            ToolConnector::connect(config.mcp.clone())
                .await
                .map_err(|e| FrameworkError::Connector(format!("{:#}", e)))?,
        );

        let mut tools = ToolRegistry::new();
        tools
            .add_provider(connector.clone())
            .await
            .map_err(|e| FrameworkError::Connector(format!("{:#}", e)))?;

        tracing::info!(
            "[Components] MCP toolset connected with {} tools",
            tools.len()
        );

        Ok(Self::from_parts(config, Arc::new(llm), tools, Some(connector)))
    }

    /// Assemble components from an already-built provider and tool registry
    pub fn from_parts(
        config: AppConfig,
        llm: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        connector: Option<Arc<ToolConnector>>,
    ) -> Self {
        let tool_names = tools.tool_names().iter().map(|s| s.to_string()).collect();

        let agent_config =
            AgentConfig::stock_transactions(config.agent_model.clone()).with_tools(Arc::new(tools));
        let agent_name = agent_config.name.clone();
        let agent = Arc::new(LlmAgent::new(agent_config, llm.clone()));

        let runner = Runner::new(config.app_name.clone(), agent, Arc::new(SessionStore::new()))
            .with_turn_timeout(config.turn_timeout);
        let summary = SummaryClient::new(llm.as_ref(), &config.summary_model);

        Self {
            config,
            runner,
            agent_name,
            summary,
            connector,
            tool_names,
        }
    }

    /// Configuration the components were built from
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start a new conversation for the configured user
    pub fn new_conversation(&self) -> ConversationContext {
        ConversationContext::new(self.config.user_id.clone())
    }

    /// Create the conversation's session up front and return its state
    pub async fn open_session(&self, conversation: &ConversationContext) -> SessionSnapshot {
        let key = SessionKey::new(
            self.runner.app_name(),
            &conversation.user_id,
            &conversation.session_id,
        );
        self.runner.store().create_or_get(key).await.snapshot().await
    }

    /// Run one turn and summarize its final response
    ///
    /// Only a blank message is an error. Agent and summary failures are
    /// reported inside the `TurnReport`.
    pub async fn process_turn(
        &self,
        conversation: &ConversationContext,
        message: &str,
    ) -> FrameworkResult<TurnReport> {
        self.process_turn_observed(conversation, message, &mut |_| {})
            .await
    }

    /// Same as `process_turn`, handing each event to `observer` as it arrives
    pub async fn process_turn_observed(
        &self,
        conversation: &ConversationContext,
        message: &str,
        observer: &mut (dyn FnMut(&Event) + Send),
    ) -> FrameworkResult<TurnReport> {
        if let Some(ref connector) = self.connector {
            if let Err(e) = connector.ensure_live().await {
                tracing::warn!("[Components] Tool server not reachable: {:#}", e);
            }
        }

        let outcome = self
            .runner
            .run_observed(
                &conversation.user_id,
                &conversation.session_id,
                Content::user_text(message),
                observer,
            )
            .await?;

        let mut report = TurnReport {
            final_text: outcome.final_text.clone(),
            events: outcome.events.clone(),
            error: outcome.error.clone(),
            ..Default::default()
        };

        if let (true, Some(text)) = (outcome.has_final_text(), outcome.final_text.as_deref()) {
            match self.summary.summarize(text).await {
                Ok(insights) => report.insights = Some(insights),
                Err(e) => {
                    let err = FrameworkError::Summary(format!("{:#}", e));
                    tracing::warn!("[Components] {}", err);
                    report.insights_error = Some(err.to_string());
                }
            }
        }

        Ok(report)
    }

    /// Current status for display
    pub async fn status(&self) -> ComponentStatus {
        let mcp_connected = match self.connector {
            Some(ref connector) => connector.server().is_connected().await,
            None => false,
        };

        ComponentStatus {
            initialized: true,
            credential_found: true,
            mcp_server: self.config.mcp.authority().to_string(),
            mcp_connected,
            agent_name: Some(self.agent_name.clone()),
            agent_model: Some(self.config.agent_model.clone()),
            summary_model: Some(self.summary.model()),
            tools: self.tool_names.clone(),
            error: None,
        }
    }
}

/// Download file name for a raw response saved at `now`
pub fn artifact_file_name(now: DateTime<Local>) -> String {
    format!("stock_transactions_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Write `text` to `dir` under the timestamped artifact name
pub fn save_artifact(dir: &Path, text: &str, now: DateTime<Local>) -> FrameworkResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(artifact_file_name(now));
    std::fs::write(&path, text)?;
    tracing::info!("[Components] Saved response to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigError;
    use chrono::TimeZone;

    #[test]
    fn test_conversations_get_fresh_session_ids() {
        let a = ConversationContext::new("user1");
        let b = ConversationContext::new("user1");
        assert_eq!(a.user_id, "user1");
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_artifact_file_name() {
        let now = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(artifact_file_name(now), "stock_transactions_20260307_090501.txt");
    }

    #[test]
    fn test_save_artifact() {
        let temp = tempfile::TempDir::new().unwrap();
        let now = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();

        let path = save_artifact(temp.path(), "ISIN rows", now).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str(),
            Some("stock_transactions_20260307_090501.txt")
        );
        assert_eq!(std::fs::read_to_string(path).unwrap(), "ISIN rows");
    }

    #[test]
    fn test_placeholder_without_insights() {
        let report = TurnReport::default();
        assert_eq!(report.insights_or_placeholder(), "No insights available");
    }

    #[test]
    fn test_failed_status_reports_missing_key() {
        let err: FrameworkError = ConfigError::MissingCredential("GEMINI_API_KEY".into()).into();
        let status = ComponentStatus::failed(&err, "localhost:8080");
        assert!(!status.initialized);
        assert!(!status.credential_found);
        assert!(status.error.unwrap().contains("GEMINI_API_KEY"));

        let err = FrameworkError::Connector("refused".into());
        assert!(ComponentStatus::failed(&err, "localhost:8080").credential_found);
    }
}
