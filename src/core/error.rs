//! Framework error types

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading configuration at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required credential is not present in the environment
    #[error("{0} not found in environment variables")]
    MissingCredential(String),

    /// A variable is present but cannot be parsed
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// Name of the environment variable
        var: String,
        /// The offending value
        value: String,
    },

    /// The web bind address cannot be parsed
    #[error("WEB_BIND is not a valid socket address: {0}")]
    InvalidBind(String),
}

/// Errors that can occur in the agent framework
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caller supplied unusable input (e.g. a blank message)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The agent event stream failed mid-turn
    #[error("Stream error: {0}")]
    Stream(String),

    /// A turn or remote call exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The summary model call failed
    #[error("Summary error: {0}")]
    Summary(String),

    /// Tool execution error
    #[error("Tool error: {0}")]
    ToolError(String),

    /// Remote tool connector failed to connect or respond
    #[error("Connector error: {0}")]
    Connector(String),

    /// Components were not initialized (startup failed)
    #[error("Components not initialized: {0}")]
    NotInitialized(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl FrameworkError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        FrameworkError::Other(msg.into())
    }

    /// Create a tool error
    pub fn tool_error(msg: impl Into<String>) -> Self {
        FrameworkError::ToolError(msg.into())
    }

    /// Create a stream error, keeping the full anyhow context chain
    pub fn stream(err: &anyhow::Error) -> Self {
        FrameworkError::Stream(format!("{:#}", err))
    }
}

/// Result type alias for framework operations
pub type FrameworkResult<T> = Result<T, FrameworkError>;
