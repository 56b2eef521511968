//! MCP (Model Context Protocol) Support
//!
//! Connects to the remote tool server and exposes its tools to the agent as
//! if they were native tools.
//!
//! # Architecture
//!
//! - `MCPServer`: Wraps the rmcp client service, with reconnection and call timeouts
//! - `MCPToolAdapter`: Adapts MCP tools to implement the Tool trait
//! - `ToolConnector`: Implements ToolProvider to feed MCP tools into a registry
//!
//! # Tool Names
//!
//! Tools are exposed under the server's own names (`fetch_stock_transactions`),
//! which is what the agent instruction refers to. With
//! `MCPServerConfig::with_namespace_tools(true)` they are prefixed with the
//! server id instead (`fi_money__fetch_stock_transactions`).

mod config;
mod connector;
mod server;
mod tool_adapter;

pub use config::MCPServerConfig;
pub use connector::ToolConnector;
pub use server::MCPServer;
pub use tool_adapter::MCPToolAdapter;
