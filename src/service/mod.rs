//! HTTP service: Axum server exposing the analyzer.
//!
//! Accepts raw text, uploaded screenshots or image URLs and answers with
//! the structured analysis plus the rendered report. CORS is open for
//! browser clients.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::ocr::MAX_IMAGE_BYTES;
pub use routes::{AppState, ServiceState};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/analyze", post(routes::analyze_text))
        .route("/api/analyze/image", post(routes::analyze_image))
        .route("/api/analyze/url", post(routes::analyze_url))
        .route("/api/history/:user_id", get(routes::get_history))
        .route("/health", get(routes::health))
        .route("/", get(routes::welcome))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Bind `host:port` and serve until Ctrl+C.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Service listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
