//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clustermap_core::AggregateError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced to HTTP clients as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Not Implemented")]
    NotImplemented,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Aggregate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Aggregate(e) = &self {
            error!(error = %e, "Failed to build occupancy report");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
