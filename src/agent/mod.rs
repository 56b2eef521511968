//! Agent layer
//!
//! - `AgentConfig` - identity, instruction, model and tools
//! - `LlmAgent` - the model/tool loop, emitted as an event stream
//! - `AgentExecutor` / `EventStream` - the seams the runner drives

pub mod config;
pub mod executor;
pub mod llm_agent;
pub mod stream;

pub use config::{
    AgentConfig, STOCK_AGENT_DESCRIPTION, STOCK_AGENT_INSTRUCTION, STOCK_AGENT_NAME,
    STOCK_AGENT_OUTPUT_KEY,
};
pub use executor::{execute_tool, AgentExecutor};
pub use llm_agent::LlmAgent;
pub use stream::{AgentEventStream, EventStream};
