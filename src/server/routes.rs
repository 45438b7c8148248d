//! Route handlers

use super::error::ApiError;
use super::AppState;
use crate::domain::ids::MeasurementRef;
use crate::domain::VitexError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

type Shared = State<Arc<AppState>>;

/// Links to the other resources
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "links": {
            "health": "/health",
            "status": "/status",
            "export": "/export",
            "failed": "/failed",
            "measurement": "/measurement/{reference}"
        }
    }))
}

/// 200 with version info, or 503 listing failing components
pub async fn health(State(state): Shared) -> Response {
    let issues = state.coordinator.check_health().await;

    if issues.is_empty() {
        (
            StatusCode::OK,
            Json(json!({
                "apiVersion": env!("CARGO_PKG_VERSION"),
                "environment": state.environment.as_str(),
            })),
        )
            .into_response()
    } else {
        tracing::warn!(failing = issues.len(), "Health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "errors": issues })),
        )
            .into_response()
    }
}

pub async fn status(State(state): Shared) -> Result<Response, ApiError> {
    let overview = state.coordinator.overview().await?;
    Ok(Json(overview).into_response())
}

/// Run one incremental export
pub async fn export(State(state): Shared) -> Result<Response, ApiError> {
    let _guard = state.run_lock.lock().await;
    let report = state.coordinator.run_export().await?;
    Ok(Json(report).into_response())
}

/// Retry the temporary failure pool, then age it
pub async fn failed(State(state): Shared) -> Result<Response, ApiError> {
    let _guard = state.run_lock.lock().await;
    let retry = state.coordinator.retry_failed().await?;

    if retry.is_empty() {
        return Ok(Json(json!({
            "status": "no measurements to export",
            "aged": retry.aged,
        }))
        .into_response());
    }
    Ok(Json(retry).into_response())
}

/// Stored state and source copy of one measurement
pub async fn measurement(
    State(state): Shared,
    Path(reference): Path<String>,
) -> Result<Response, ApiError> {
    let reference = MeasurementRef::new(reference).map_err(VitexError::Validation)?;
    let lookup = state.coordinator.lookup(&reference).await?;
    Ok(Json(lookup).into_response())
}
