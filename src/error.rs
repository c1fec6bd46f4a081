//! # Error Handling
//!
//! Custom error types for the HTTP surface and how they are converted to
//! responses. Session-internal failures (malformed media payloads, AI-leg
//! drops) never reach this layer as HTTP errors; they are handled inside the
//! WebSocket actor per the failure semantics in the session module.
//!
//! ## Error Categories:
//! - **Internal**: server-side problems (500)
//! - **BadRequest**: client sent invalid data (400)
//! - **NotFound**: requested resource doesn't exist (404)
//! - **ConfigError**: configuration problems (500)
//! - **Upstream**: the AI provider rejected or dropped the connection (502)

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Application-level errors surfaced over HTTP.
#[derive(Debug)]
pub enum AppError {
    /// Internal server errors
    Internal(String),

    /// Client sent invalid or malformed data
    BadRequest(String),

    /// Requested resource was not found
    NotFound(String),

    /// Configuration file or environment variable problems
    ConfigError(String),

    /// AI provider connect/auth failures
    Upstream(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "bad_request",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "not_found",
                msg.clone(),
            ),
            AppError::ConfigError(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                msg.clone(),
            ),
            AppError::Upstream(msg) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "upstream_error",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<crate::ai::ClientError> for AppError {
    fn from(err: crate::ai::ClientError) -> Self {
        match err {
            crate::ai::ClientError::UnsupportedProvider(p) => {
                AppError::ConfigError(format!("unsupported AI provider: {}", p))
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            AppError::BadRequest("x".into()).error_response().status(),
            actix_web::http::StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upstream("x".into()).error_response().status(),
            actix_web::http::StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::NotFound("x".into()).error_response().status(),
            actix_web::http::StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_client_error_conversion() {
        let err: AppError = crate::ai::ClientError::NotConnected.into();
        assert!(matches!(err, AppError::Upstream(_)));

        let err: AppError =
            crate::ai::ClientError::UnsupportedProvider("acme".to_string()).into();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
