//! Route definitions and handlers for the web UI

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::app::{artifact_file_name, ComponentStatus};
use crate::core::{Event, FrameworkError};

use super::app_state::SharedState;
use super::page::IndexTemplate;

/// Build the router with all routes and shared state
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/conversations", post(create_conversation))
        .route("/api/conversations/{id}/download", get(download))
        .route("/api/turn", post(run_turn))
        .with_state(state)
}

/// Body of `POST /api/turn`
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    /// User message
    pub message: String,
    /// Conversation to continue; a new one is opened when absent
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Reply to `POST /api/turn`
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub conversation_id: String,
    pub final_text: Option<String>,
    /// Summary, or the placeholder when there is none
    pub insights: String,
    pub events: Vec<Event>,
    pub error: Option<String>,
    pub insights_error: Option<String>,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (code, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn not_initialized(status: &ComponentStatus) -> Response {
    let reason = status
        .error
        .clone()
        .unwrap_or_else(|| "components not initialized".to_string());
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        FrameworkError::NotInitialized(reason).to_string(),
    )
}

/// GET / - Status panel and request form
async fn index(State(state): State<SharedState>) -> IndexTemplate {
    IndexTemplate::new(&state.status().await)
}

/// GET /health - Returns 200 OK with a simple JSON body
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/status - Initialization status
async fn status(State(state): State<SharedState>) -> Json<ComponentStatus> {
    Json(state.status().await)
}

/// POST /api/conversations - Open a conversation with a fresh session id
async fn create_conversation(State(state): State<SharedState>) -> Response {
    match state.open_conversation().await {
        Some((id, _)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "conversation_id": id })),
        )
            .into_response(),
        None => not_initialized(&state.status().await),
    }
}

/// POST /api/turn - Run one turn and summarize it
async fn run_turn(State(state): State<SharedState>, Json(req): Json<TurnRequest>) -> Response {
    let Some(components) = state.components().cloned() else {
        return not_initialized(&state.status().await);
    };

    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message is empty");
    }

    let (conversation_id, conversation) = match req.conversation_id {
        Some(id) => match state.conversation(&id).await {
            Some(conversation) => (id, conversation),
            None => return error_response(StatusCode::NOT_FOUND, "conversation not found"),
        },
        None => match state.open_conversation().await {
            Some(opened) => opened,
            None => return not_initialized(&state.status().await),
        },
    };

    // Held for the whole turn so one session never runs two turns at once
    let mut conversation = conversation.lock().await;

    let report = match components
        .process_turn(&conversation.context, &req.message)
        .await
    {
        Ok(report) => report,
        Err(FrameworkError::InvalidInput(msg)) => {
            return error_response(StatusCode::BAD_REQUEST, msg);
        }
        Err(e) => {
            tracing::error!("[Web] Turn failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    if report.final_text.is_some() {
        conversation.last_final_text = report.final_text.clone();
    }

    let insights = report.insights_or_placeholder().to_string();
    Json(TurnResponse {
        conversation_id,
        final_text: report.final_text,
        insights,
        events: report.events,
        error: report.error,
        insights_error: report.insights_error,
    })
    .into_response()
}

/// GET /api/conversations/{id}/download - Last raw answer as a text file
async fn download(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let Some(conversation) = state.conversation(&id).await else {
        return error_response(StatusCode::NOT_FOUND, "conversation not found");
    };

    let Some(text) = conversation.lock().await.last_final_text.clone() else {
        return error_response(StatusCode::NOT_FOUND, "no response to download");
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        artifact_file_name(Local::now())
    );
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    )
        .into_response()
}
