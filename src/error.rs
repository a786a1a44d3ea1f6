// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Refresh cooldown: {0}")]
    Cooldown(String),

    #[error("Backend API error: {0}")]
    Backend(String),

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message the backend client uses for a 401 from the SocialLeaf API.
    pub const BACKEND_TOKEN_ERROR: &'static str = "Backend rejected the access token";

    /// User-facing message for any failed export.
    pub const REPORT_FAILED_MESSAGE: &'static str = "Failed to generate PDF. Please try again.";

    /// True when the backend refused the session's bearer token.
    pub fn is_backend_auth_error(&self) -> bool {
        match self {
            AppError::InvalidToken => true,
            AppError::Backend(msg) => msg == Self::BACKEND_TOKEN_ERROR,
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Cooldown(msg) => (
                StatusCode::TOO_MANY_REQUESTS,
                "refresh_cooldown",
                Some(msg.clone()),
            ),
            AppError::Backend(msg) => {
                tracing::warn!(error = %msg, "Backend API error");
                (StatusCode::BAD_GATEWAY, "backend_error", Some(msg.clone()))
            }
            AppError::Report(msg) => {
                tracing::error!(error = %msg, "Report generation error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "report_failed",
                    Some(Self::REPORT_FAILED_MESSAGE.to_string()),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
