//! Core types for the agent framework
//!
//! This module provides the fundamental types used throughout the crate:
//! - `Content` / `Part` - Messages exchanged with an agent
//! - `Event` / `EventKind` - What an agent emits during a turn
//! - `FrameworkError` / `ConfigError` - Error types

pub mod content;
pub mod error;
pub mod event;

pub use content::{Content, Part};
pub use error::{ConfigError, FrameworkError, FrameworkResult};
pub use event::{Event, EventKind, IntermediateEvent};
