use crate::api::handlers::ApiState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn health_routes() -> Router<ApiState> {
    Router::new()
        .route("/health", get(super::handlers::health_check))
        .route("/info", get(super::handlers::agent_info))
}

pub fn chat_routes() -> Router<ApiState> {
    Router::new().route("/chat", post(super::handlers::chat))
}
