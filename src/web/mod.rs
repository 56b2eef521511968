//! Web UI
//!
//! An axum server over the same `Components` the console uses. Components
//! are built once at startup and reused for every request; if startup
//! failed the server still runs and shows the configuration error.

mod app_state;
mod page;
mod routes;

pub use app_state::{AppState, ConversationState, SharedState, MAX_CONVERSATIONS};
pub use page::IndexTemplate;
pub use routes::{create_router, TurnRequest, TurnResponse};

use std::net::SocketAddr;

use anyhow::{Context, Result};

/// Bind `addr` and serve the UI until the process ends
pub async fn serve(state: SharedState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("[Web] Listening on http://{}", addr);
    tracing::info!("[Web]   GET  /                                  - Status and request form");
    tracing::info!("[Web]   GET  /health                            - Health check");
    tracing::info!("[Web]   GET  /api/status                        - Initialization status");
    tracing::info!("[Web]   POST /api/conversations                 - New conversation");
    tracing::info!("[Web]   POST /api/turn                          - Run one turn");
    tracing::info!("[Web]   GET  /api/conversations/{{id}}/download - Last response");

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
