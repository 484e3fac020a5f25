//! HTTP API
//!
//! Exposes the assistant over `axum`:
//!
//! - `POST /chat` with `{message, session_id?}`
//! - `GET /health`
//! - `POST /sessions/:id/clear`
//! - `GET /sessions/stats`

use crate::agent::{Assistant, StructuredResult};
use crate::error::{AssistantError, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const STATS_SAMPLE: usize = 10;

/// Body of `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Customer message
    #[serde(default)]
    pub message: String,
    /// Session to continue; a new id is generated when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Successful `POST /chat` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: StructuredResult,
    pub session_id: String,
    pub status: String,
}

/// Error body returned with 4xx/5xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

/// `GET /health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub memory_backend: String,
    pub memory_persistent: bool,
    pub active_sessions: usize,
    pub tools: Vec<String>,
    pub checked_at: String,
}

/// `GET /sessions/stats` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub active_sessions: usize,
    pub sample: Vec<String>,
}

/// `POST /sessions/:id/clear` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub session_id: String,
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            status: "error".to_string(),
        }),
    )
}

/// Build the API router around a shared assistant
pub fn router(assistant: Arc<Assistant>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/sessions/stats", get(session_stats))
        .route("/sessions/:id/clear", post(clear_session))
        .with_state(assistant)
}

/// Bind `address` and serve until the process is stopped
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn serve(assistant: Arc<Assistant>, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(bind_address = %address, "HTTP API listening");

    axum::serve(listener, router(assistant)).await?;
    Ok(())
}

async fn chat(
    State(assistant): State<Arc<Assistant>>,
    Json(request): Json<ChatRequest>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    let session_id = match request.session_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };

    match assistant.chat(&request.message, &session_id).await {
        Ok(response) => Ok(Json(ChatResponse {
            response,
            session_id,
            status: "success".to_string(),
        })),
        Err(e) => match e.downcast_ref::<AssistantError>() {
            Some(AssistantError::InvalidInput(message)) => {
                Err(api_error(StatusCode::BAD_REQUEST, message.clone()))
            }
            _ => {
                tracing::error!(session_id = %session_id, error = %e, "Chat request failed");
                Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
            }
        },
    }
}

async fn health(State(assistant): State<Arc<Assistant>>) -> Json<HealthResponse> {
    let memory = assistant.memory();
    Json(HealthResponse {
        status: if memory.is_persistent() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        service: "retail-assistant".to_string(),
        memory_backend: memory.backend_name().to_string(),
        memory_persistent: memory.is_persistent(),
        active_sessions: assistant.active_session_count(),
        tools: assistant.tool_names(),
        checked_at: Utc::now().to_rfc3339(),
    })
}

async fn session_stats(State(assistant): State<Arc<Assistant>>) -> Json<SessionStats> {
    let sessions = assistant.active_sessions();
    Json(SessionStats {
        active_sessions: sessions.len(),
        sample: sessions.into_iter().take(STATS_SAMPLE).collect(),
    })
}

async fn clear_session(
    State(assistant): State<Arc<Assistant>>,
    Path(id): Path<String>,
) -> Json<ClearResponse> {
    assistant.clear_session(&id);
    Json(ClearResponse {
        session_id: id,
        status: "cleared".to_string(),
    })
}
