//! Custom error types for the API service
//!
//! Every handler returns [`ApiResult`], so all failures leave through the
//! same `IntoResponse` impl and pick up the same layers (CORS, tracing).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::{DatabaseError, NotificationError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required field or parameter is missing
    #[error("{0}")]
    BadRequest(String),

    /// The request body is not the JSON the operation expects
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// The key-value store failed
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The notification channel failed
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl ApiError {
    pub fn missing(field: &str) -> Self {
        ApiError::BadRequest(format!("Missing {}", field))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.to_string();

        if status.is_server_error() {
            error!("Request failed: {}", error_message);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
