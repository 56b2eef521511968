//! Tool system for the agent
//!
//! This module provides:
//! - `Tool` trait - Interface for implementing tools
//! - `ToolResult` - Result type for tool execution
//! - `ToolRegistry` - Registry for managing available tools
//! - `ToolProvider` trait - Interface for dynamic tool sources (MCP)

mod provider;
mod registry;
mod tool;

pub use provider::ToolProvider;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolResult};
