//! Agent Configuration
//!
//! Identity, instructions and tool binding for an `LlmAgent`.

use std::sync::Arc;

use crate::llm::ToolDefinition;
use crate::tools::ToolRegistry;

/// Name of the stock transactions agent
pub const STOCK_AGENT_NAME: &str = "fetch_stock_transactions_agent";

/// Description of the stock transactions agent
pub const STOCK_AGENT_DESCRIPTION: &str = "Agent for accessing all stock transactions from accounts connected to the Fi Money app. \
Use cases: Retrieve all stock transactions, including ISIN as identifier, transaction type (Buy, Sell, Dividend), \
transaction date, and NAV value of each transaction. Data is sourced directly from user-linked accounts in Fi Money.";

/// Instruction handed to the model
pub const STOCK_AGENT_INSTRUCTION: &str = "Assist the user in accessing their stock transactions from accounts connected to the Fi Money app. \
Provide details such as ISIN, transaction type (Buy, Sell, Dividend), transaction date, and NAV value. \
Only use the fetch_stock_transactions tool and do not estimate or fabricate data. \
Return only actual data available from Fi Money.";

/// Session state key the final answer is written under
pub const STOCK_AGENT_OUTPUT_KEY: &str = "last_result";

/// Configuration for an `LlmAgent`
///
/// ```ignore
/// let config = AgentConfig::new("fetch_stock_transactions_agent", "gemini-2.0-flash")
///     .with_instruction("Only use the fetch tool.")
///     .with_tools(tools)
///     .with_output_key("last_result");
/// ```
#[derive(Clone)]
pub struct AgentConfig {
    /// Agent name, used as the author of every event
    pub name: String,

    /// What the agent is for
    pub description: String,

    /// Instruction for the model
    pub instruction: String,

    /// Model id the agent is bound to
    pub model: String,

    /// Tool registry (optional - agent can work without tools)
    pub tools: Option<Arc<ToolRegistry>>,

    /// Session state key the final text is stored under
    pub output_key: Option<String>,

    /// Maximum number of model calls per turn
    pub max_tool_iterations: usize,
}

impl AgentConfig {
    /// Create a new agent configuration
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model: model.into(),
            tools: None,
            output_key: None,
            max_tool_iterations: 25,
        }
    }

    /// The Fi Money stock transactions agent
    pub fn stock_transactions(model: impl Into<String>) -> Self {
        Self::new(STOCK_AGENT_NAME, model)
            .with_description(STOCK_AGENT_DESCRIPTION)
            .with_instruction(STOCK_AGENT_INSTRUCTION)
            .with_output_key(STOCK_AGENT_OUTPUT_KEY)
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the instruction
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Set the tool registry
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the session state key for the final text
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    /// Set maximum model calls per turn
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// System prompt built from instruction, name and description
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.instruction.clone();
        if !self.description.is_empty() {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str(&format!(
                "You are an agent. Your internal name is \"{}\". The description about you is \"{}\".",
                self.name, self.description
            ));
        }
        prompt
    }

    /// Get tool definitions (empty vec if no tools)
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .as_ref()
            .map(|t| t.get_definitions())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field(
                "instruction",
                &format!("{}...", self.instruction.chars().take(50).collect::<String>()),
            )
            .field("tools", &self.tools.as_ref().map(|t| t.tool_names()))
            .field("output_key", &self.output_key)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_agent_identity() {
        let config = AgentConfig::stock_transactions("gemini-2.0-flash");
        assert_eq!(config.name, "fetch_stock_transactions_agent");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.output_key.as_deref(), Some("last_result"));
        assert!(config.instruction.contains("do not estimate or fabricate data"));
        assert!(config.tool_definitions().is_empty());
    }

    #[test]
    fn test_system_prompt_includes_description() {
        let config = AgentConfig::new("a", "m")
            .with_instruction("Be brief.")
            .with_description("Reads rows");
        let prompt = config.system_prompt();
        assert!(prompt.starts_with("Be brief."));
        assert!(prompt.contains("\"a\""));
        assert!(prompt.contains("Reads rows"));

        let bare = AgentConfig::new("a", "m").with_instruction("Only this");
        assert_eq!(bare.system_prompt(), "Only this");
    }
}
