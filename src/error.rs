//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` for all error conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP
//! responses with JSON error bodies.
//!
//! Error mappings:
//! - `RepoNotFound` → 404
//! - `Adapter` → 502 (the git technology reported failure; text is verbatim)
//! - `Config`, `Internal` → 500
//!
//! Cache corruption and remote-list parse failures never appear here: both
//! are recovered where they happen and only logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The underlying git technology failed; the message is its diagnostic
    /// text, passed through uninterpreted.
    #[error("git backend error: {0}")]
    Adapter(String),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    /// The data directory or settings store could not be initialized.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<git2::Error> for AppError {
    fn from(e: git2::Error) -> Self {
        AppError::Adapter(e.message().to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Adapter(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::RepoNotFound(path) => {
                (StatusCode::NOT_FOUND, format!("Repository not found: {}", path))
            }
            AppError::Config(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Configuration error: {}", msg))
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
