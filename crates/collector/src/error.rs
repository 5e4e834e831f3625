//! Collector error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Collector errors
#[derive(Debug, Error)]
pub enum CollectorError {
    /// No record for the requested series
    #[error("Series not found")]
    NotFound,

    /// Request body rejected
    #[error("{0}")]
    Validation(String),

    /// Stored row cannot be mapped back to a payload
    #[error("corrupt record '{series_instance_uid}': {message}")]
    CorruptRecord {
        series_instance_uid: String,
        message: String,
    },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (bind, accept)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Collector Result alias
pub type Result<T> = std::result::Result<T, CollectorError>;

impl IntoResponse for CollectorError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::CorruptRecord { .. } | Self::Database(_) | Self::Io(_) => {
                error!(error = %self, "collector request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
