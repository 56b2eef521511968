pub mod core;
pub mod session;
pub mod tools;

// Gemini provider and message types
pub mod llm;

// MCP (Model Context Protocol) tool server connection
pub mod mcp;

// The stock transactions agent and its event stream
pub mod agent;

// Turn execution over the session store
pub mod runner;

// Summaries of final answers
pub mod helpers;

// Startup configuration and wiring
pub mod app;
pub mod config;
pub mod logging;

// Presentation
pub mod cli;
pub mod web;
