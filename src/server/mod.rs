//! HTTP surface
//!
//! | Route                     | Action                                   |
//! |---------------------------|------------------------------------------|
//! | `GET /`                   | links to the other resources             |
//! | `GET /health`             | 200, or 503 with failing components      |
//! | `GET /status`             | totals, run history and endpoint health  |
//! | `GET /export`             | one incremental run                      |
//! | `GET /failed`             | retry temporary failures, then age them  |
//! | `GET /measurement/{ref}`  | stored state and source copy             |
//!
//! Runs started over HTTP are serialized so they never overlap.

pub mod error;
pub mod routes;

pub use error::ApiError;

use crate::config::{Environment, ServerConfig};
use crate::core::export::ExportCoordinator;
use crate::domain::{Result, VitexError};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tower_http::trace::TraceLayer;

/// State shared by every handler
pub struct AppState {
    pub coordinator: Arc<ExportCoordinator>,
    pub environment: Environment,

    /// Held for the duration of a run
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(coordinator: Arc<ExportCoordinator>, environment: Environment) -> Self {
        Self {
            coordinator,
            environment,
            run_lock: Mutex::new(()),
        }
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/status", get(routes::status))
        .route("/export", get(routes::export))
        .route("/failed", get(routes::failed))
        .route("/measurement/*reference", get(routes::measurement))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until the shutdown channel flips to `true`
///
/// In-flight requests are drained before returning.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(
    config: &ServerConfig,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| VitexError::Io(format!("Failed to bind {address}: {e}")))?;

    tracing::info!(address = %address, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("Draining HTTP server");
        })
        .await
        .map_err(|e| VitexError::Io(format!("Server error: {e}")))?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
