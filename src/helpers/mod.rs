//! Helpers layered on top of the agent
//!
//! - `SummaryClient` - Short insights on a final answer from a second model

mod summarizer;

pub use summarizer::{SummaryClient, DEFAULT_SUMMARY_MODEL, SUMMARY_INSTRUCTION};
