use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
}

async fn index_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "active",
        message: Some("Бот для поиска ретро автомобилей работает!"),
    })
}

/// Liveness probe for the hosting platform
async fn health_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "healthy",
        message: None,
    })
}

/// Serve the status endpoints on all interfaces until `shutdown` fires
pub async fn serve(port: u16, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind health server to port {port}"))?;
    serve_on(listener, shutdown).await
}

pub async fn serve_on(listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
    info!("Health server listening on {}", listener.local_addr()?);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Health server failed")
}
