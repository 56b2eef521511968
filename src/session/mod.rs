//! Session management for agents
//!
//! This module provides `Session` for per-conversation state and history,
//! and `SessionStore` for looking sessions up by their
//! (application, user, session id) key.

pub mod session;
pub mod store;

pub use session::{Session, SessionKey, SessionSnapshot};
pub use store::SessionStore;
