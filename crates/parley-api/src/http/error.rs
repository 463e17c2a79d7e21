//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat service errors.
    Chat(ChatError),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Chat(e @ ChatError::SessionNotFound) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", e.to_string())
            }
            AppError::Chat(e @ ChatError::QuotaNotFound) => {
                (StatusCode::NOT_FOUND, "QUOTA_NOT_FOUND", e.to_string())
            }
            AppError::Chat(e @ ChatError::AccessDenied) => {
                (StatusCode::FORBIDDEN, "ACCESS_DENIED", e.to_string())
            }
            AppError::Chat(e @ ChatError::TokenRequired) => {
                (StatusCode::UNAUTHORIZED, "TOKEN_REQUIRED", e.to_string())
            }
            AppError::Chat(e @ ChatError::InvalidToken) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", e.to_string())
            }
            AppError::Chat(e @ ChatError::QuotaExceeded) => {
                (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED", e.to_string())
            }
            AppError::Chat(e @ ChatError::EmptyContent) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Chat(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CHAT_ERROR", e.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_maps_to_429() {
        let resp = AppError::Chat(ChatError::QuotaExceeded).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_token_errors_map_to_401() {
        let resp = AppError::Chat(ChatError::TokenRequired).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp = AppError::Chat(ChatError::InvalidToken).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_access_denied_maps_to_403() {
        let resp = AppError::Chat(ChatError::AccessDenied).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
