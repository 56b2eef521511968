//! Message content exchanged with an agent
//!
//! A `Content` is an ordered sequence of parts authored by one role. User
//! messages are a single text part; final agent responses may carry several.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single part of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Part {
    /// Plain text
    Text(String),
    /// Structured data
    Data(Value),
}

impl Part {
    /// Get the text if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text.as_str()),
            Part::Data(_) => None,
        }
    }
}

/// Ordered sequence of parts from one author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// "user" or "model"
    pub role: String,
    /// Parts in emission order
    pub parts: Vec<Part>,
}

impl Content {
    /// A user message with a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// A model response with a single text part
    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Text of the first part, if that part is text
    pub fn first_text(&self) -> Option<&str> {
        self.parts.first().and_then(Part::as_text)
    }

    /// All text parts joined with newlines
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when no part carries non-whitespace text or data
    pub fn is_blank(&self) -> bool {
        self.parts.iter().all(|part| match part {
            Part::Text(text) => text.trim().is_empty(),
            Part::Data(value) => value.is_null(),
        })
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.role)?;
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            match part {
                Part::Text(text) => write!(f, "{}", text)?,
                Part::Data(value) => write!(f, "{}", value)?,
            }
        }
        Ok(())
    }
}
