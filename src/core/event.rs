//! Events emitted by an agent during a turn
//!
//! Every turn produces a sequence of intermediate events followed by at most
//! one final event. The shape is decided once, where the agent translates
//! model and tool output, so consumers only ever match on `EventKind`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::content::Content;

/// Non-terminal progress inside a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntermediateEvent {
    /// Text the model produced alongside tool calls
    ModelText {
        /// The text
        text: String,
    },

    /// The model asked for a tool invocation
    ToolCall {
        /// Tool use ID
        id: String,
        /// Tool name as exposed to the model
        name: String,
        /// Arguments supplied by the model
        args: Value,
    },

    /// A tool invocation finished
    ToolResponse {
        /// Tool use ID
        id: String,
        /// Tool name as exposed to the model
        name: String,
        /// Tool output
        output: String,
        /// Whether the tool reported an error
        is_error: bool,
    },
}

/// Intermediate or terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Progress that precedes the answer
    Intermediate {
        /// The progress payload
        event: IntermediateEvent,
    },

    /// The complete answer for this turn
    Final {
        /// Final content parts
        content: Content,
    },
}

/// An immutable record emitted during a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID
    pub id: String,
    /// Name of the agent that produced the event
    pub author: String,
    /// Emission time
    pub timestamp: DateTime<Utc>,
    /// Payload
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    fn new(author: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author: author.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Create an intermediate event
    pub fn intermediate(author: impl Into<String>, event: IntermediateEvent) -> Self {
        Self::new(author, EventKind::Intermediate { event })
    }

    /// Create a tool call event
    pub fn tool_call(
        author: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
        args: Value,
    ) -> Self {
        Self::intermediate(
            author,
            IntermediateEvent::ToolCall {
                id: id.into(),
                name: name.into(),
                args,
            },
        )
    }

    /// Create a tool response event
    pub fn tool_response(
        author: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
        output: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self::intermediate(
            author,
            IntermediateEvent::ToolResponse {
                id: id.into(),
                name: name.into(),
                output: output.into(),
                is_error,
            },
        )
    }

    /// Create a final event
    pub fn final_response(author: impl Into<String>, content: Content) -> Self {
        Self::new(author, EventKind::Final { content })
    }

    /// Check if this is the terminal event of the turn
    pub fn is_final_response(&self) -> bool {
        matches!(self.kind, EventKind::Final { .. })
    }

    /// Text of the first content part of a final event
    pub fn final_text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Final { content } => content.first_text(),
            EventKind::Intermediate { .. } => None,
        }
    }

    /// Check if this is a tool-related event
    pub fn is_tool(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Intermediate {
                event: IntermediateEvent::ToolCall { .. } | IntermediateEvent::ToolResponse { .. }
            }
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self.timestamp.format("%H:%M:%S%.3f");
        match &self.kind {
            EventKind::Intermediate { event } => match event {
                IntermediateEvent::ModelText { text } => {
                    write!(f, "[{}] {} text: {}", time, self.author, text)
                }
                IntermediateEvent::ToolCall { id, name, args } => {
                    write!(f, "[{}] {} tool_call {} ({}): {}", time, self.author, name, id, args)
                }
                IntermediateEvent::ToolResponse {
                    id,
                    name,
                    output,
                    is_error,
                } => {
                    let label = if *is_error { "tool_error" } else { "tool_response" };
                    write!(f, "[{}] {} {} {} ({}): {}", time, self.author, label, name, id, output)
                }
            },
            EventKind::Final { content } => {
                write!(f, "[{}] {} final {}", time, self.author, content)
            }
        }
    }
}
