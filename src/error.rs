//! Application error and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::forecast::{ForecastError, ForecastId};

/// Result type for query and handler operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Forecast {0} already exists")]
    Duplicate(ForecastId),

    #[error("Snapshot {0} is already approved")]
    AlreadyApproved(i64),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forecast(ForecastError::Format(_)) => StatusCode::BAD_REQUEST,
            // a stored forecast or snapshot with no rows is a write-path bug
            Self::Forecast(ForecastError::EmptyInput) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Forecast(ForecastError::Overflow) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Duplicate(_) | Self::AlreadyApproved(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
