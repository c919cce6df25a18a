pub mod handlers;
pub mod routes;

use crate::agent::ChatAgent;
use crate::config::AppConfig;
use anyhow::Result;
use axum::Router;
use handlers::ApiState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Serve the chat agent over HTTP until ctrl-c/SIGTERM, then close the
/// agent session.
pub async fn start_server(config: &AppConfig, agent: Arc<ChatAgent>) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);

    let app = build_router(ApiState {
        agent: agent.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Agent info:   http://{}/info", addr);
    info!("Chat:         POST http://{}/chat", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(agent))
        .await?;

    Ok(())
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::chat_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal(agent: Arc<ChatAgent>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down...");
        },
    }

    if let Err(e) = agent.close().await {
        tracing::error!("Error closing agent session: {}", e);
    }
}
