//! HTTP error responses

use crate::domain::{SourceError, StoreError, VitexError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Library error rendered as a JSON response
#[derive(Debug)]
pub struct ApiError(pub VitexError);

impl From<VitexError> for ApiError {
    fn from(error: VitexError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            VitexError::Store(StoreError::NotFound(_))
            | VitexError::Source(SourceError::NotFound(_)) => StatusCode::NOT_FOUND,
            VitexError::Validation(_) => StatusCode::BAD_REQUEST,
            VitexError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
