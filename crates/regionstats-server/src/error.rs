use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regionstats_core::RegionStatsError;
use serde_json::json;
use thiserror::Error;

/// Central error type for the HTTP layer
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] RegionStatsError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(err = %self, "request failed");

        let (error_message, code) = match self {
            AppError::Storage(_) => ("Storage unavailable".to_string(), "STORAGE_ERROR"),
            AppError::Internal(_) => ("Internal server error".to_string(), "INTERNAL_ERROR"),
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
