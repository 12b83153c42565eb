//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from fest-core to HTTP status codes and returns JSON
//! error bodies with a stable code, a user-facing message, and optional
//! details. Internal error messages are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fest_core::messages::auth_error_message;
use fest_core::validate::RegistrationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses use this format. `details` carries the full
/// violation list for 422 validation errors and is omitted otherwise.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR",
    /// or an auth code like "email-already-in-use").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A single validation failure (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Registration/edit validation failed (422). Carries every violated
    /// rule; the first message is shown, the rest ride in `details`.
    #[error("validation failed with {} error(s)", .0.len())]
    ValidationList(Vec<String>),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure with a mapped user-facing message. The code
    /// picks both the HTTP status and the message shown to the user.
    #[error("auth error: {0}")]
    Auth(&'static str),

    /// Authentication failure — missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure — insufficient permissions (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shortcut for the common invalid-credentials failure.
    pub fn invalid_credentials() -> Self {
        Self::Auth("invalid-credentials")
    }

    /// Return the HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::ValidationList(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Auth(code) => (auth_status(code), code),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

fn auth_status(code: &str) -> StatusCode {
    match code {
        "email-already-in-use" => StatusCode::CONFLICT,
        "weak-password" | "invalid-email" => StatusCode::UNPROCESSABLE_ENTITY,
        "user-disabled" => StatusCode::FORBIDDEN,
        "too-many-requests" => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::UNAUTHORIZED,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let code = code.to_string();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Auth(auth_code) => auth_error_message(auth_code).to_string(),
            Self::ValidationList(errors) => errors
                .first()
                .cloned()
                .unwrap_or_else(|| "validation failed".to_string()),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match &self {
            Self::ValidationList(errors) => Some(serde_json::json!({ "errors": errors })),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Registration rule violations map to a 422 with the full list attached.
impl From<Vec<RegistrationError>> for AppError {
    fn from(errors: Vec<RegistrationError>) -> Self {
        Self::ValidationList(errors.iter().map(|e| e.to_string()).collect())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases: Vec<(AppError, StatusCode, &str)> = vec![
            (
                AppError::NotFound("team".into()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AppError::Validation("bad field".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (
                AppError::BadRequest("malformed".into()),
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
            ),
            (
                AppError::Unauthorized("no token".into()),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                AppError::Forbidden("admin only".into()),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
            (
                AppError::Conflict("exists".into()),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            let (s, c) = err.status_and_code();
            assert_eq!(s, status);
            assert_eq!(c, code);
        }
    }

    #[test]
    fn auth_codes_pick_status() {
        assert_eq!(
            AppError::Auth("email-already-in-use").status_and_code().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth("user-disabled").status_and_code().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::invalid_credentials().status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
    }

    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn validation_list_carries_every_violation() {
        let err = AppError::ValidationList(vec![
            "Team name is required".to_string(),
            "Please select at least one sport".to_string(),
        ]);
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.message, "Team name is required");
        let details = body.error.details.expect("details present");
        assert_eq!(details["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn auth_error_uses_mapped_message() {
        let (status, body) = response_parts(AppError::Auth("user-not-found")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error.code, "user-not-found");
        assert_eq!(body.error.message, "No account found with this email.");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(!body.error.message.contains("db connection"));
        assert!(body.error.details.is_none());
    }

    #[test]
    fn registration_errors_convert() {
        let errors = vec![RegistrationError::NoSportsSelected];
        let app_err = AppError::from(errors);
        match app_err {
            AppError::ValidationList(msgs) => {
                assert_eq!(msgs, vec!["Please select at least one sport".to_string()]);
            }
            other => panic!("expected ValidationList, got {other:?}"),
        }
    }
}
