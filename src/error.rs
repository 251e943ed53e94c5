use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages shared between handlers and tests.
pub mod msg {
    pub const MISSING_SIGNATURE: &str = "X-Signature header is required";
    pub const MALFORMED_SIGNATURE_HEADER: &str = "X-Signature header must be ASCII hex";
    pub const ACCESS_DENIED: &str = "Access denied";
    pub const INVALID_WEBHOOK_SECRET: &str = "Webhook secret cannot be used as an HMAC key";
    pub const CRITICAL_SECTION_PANICKED: &str = "Payment processing task failed";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid payload: {}", .0.join("; "))]
    InvalidPayload(Vec<String>),

    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Coordination store error: {0}")]
    Coordination(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::InvalidPayload(issues) => {
                tracing::warn!("Validation error: {}", issues.join("; "));
                (StatusCode::BAD_REQUEST, "Invalid payload", Some(issues.join("; ")))
            }
            AppError::MissingSignature => (
                StatusCode::UNAUTHORIZED,
                "Missing signature",
                Some(msg::MISSING_SIGNATURE.to_string()),
            ),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "Invalid signature",
                Some(msg::ACCESS_DENIED.to_string()),
            ),
            AppError::Coordination(e) => {
                tracing::error!("Coordination store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
