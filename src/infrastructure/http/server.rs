//! Router assembly and serving for the enforcement proxy.

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use super::handlers::{handle_audit, handle_health, handle_metrics, handle_tool, AppState};

/// Build the proxy router over shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tool/{name}", post(handle_tool))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .route("/audit", get(handle_audit))
        .with_state(state)
}

/// Bind and serve the proxy until the process is stopped.
pub async fn serve(port: u16, state: AppState) -> Result<()> {
    let app = build_router(state);
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("enforcement proxy listening on {addr}");
    axum::serve(listener, app)
        .await
        .context("proxy server terminated")?;
    Ok(())
}
