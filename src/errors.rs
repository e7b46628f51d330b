use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::{photo_client::PhotoServiceError, upload_service::UploadError};

/// A lightweight wrapper for general errors that keeps the message local.
///
/// `message` is what the client sees; backend causes are logged where the
/// conversion happens and never copied into it.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFile => AppError::bad_request("No file provided"),
            UploadError::InvalidUrl(_) => AppError::bad_request("Invalid file URL"),
            UploadError::InvalidFolder(err) => AppError::bad_request(err.to_string()),
            other => {
                tracing::error!(error = ?other, "asset storage operation failed");
                AppError::internal("Storage operation failed")
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::debug!(error = %err, "rejected multipart body");
        AppError::new(err.status(), "Malformed multipart form data")
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::new(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<PhotoServiceError> for AppError {
    fn from(err: PhotoServiceError) -> Self {
        match err {
            PhotoServiceError::NotAuthorized => {
                AppError::new(StatusCode::UNAUTHORIZED, "Photo service is not authorized")
            }
            other => {
                tracing::error!(error = ?other, "photo service call failed");
                AppError::new(StatusCode::BAD_GATEWAY, "Photo service request failed")
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = ?err, "database query failed");
        AppError::internal("Database operation failed")
    }
}
