use crate::agent::ChatAgent;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<ChatAgent>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

pub(crate) async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "fireside",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) async fn agent_info(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "tools": state.agent.tool_names(),
        "turns": state.agent.transcript_len().await,
    }))
}

pub(crate) async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "message must not be empty",
                "code": StatusCode::BAD_REQUEST.as_u16(),
            })),
        );
    }

    info!("Received chat message ({} chars)", request.message.len());

    let reply = state.agent.submit(&request.message).await;
    (StatusCode::OK, Json(json!({ "reply": reply })))
}
