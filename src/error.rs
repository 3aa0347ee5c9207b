//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` with one variant per failure kind of the history engine
//! and implements Axum's `IntoResponse` so the transport layer can turn them
//! into JSON error bodies.
//!
//! Error mappings:
//! - `NotFound` → 404
//! - `InvalidArgument` → 400
//! - `Sync`, `Clone`, `Reopen`, `Execution` → 503
//! - `Config`, `File`, `Decode`, `Format`, `Internal` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot use local repository at {path}: {reason}")]
    Sync { path: String, reason: String },

    #[error("Failed to clone {url} into {path}: {source}")]
    Clone {
        url: String,
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to reopen freshly cloned repository at {path}: {source}")]
    Reopen {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Query tool failed: {command}: {detail}")]
    Execution { command: String, detail: String },

    #[error("Cannot read query output {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed query output in {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Content of {what} is not valid JSON: {source}")]
    Format {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification handed to whatever transport sits on top of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Unavailable,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::Sync { .. }
            | AppError::Clone { .. }
            | AppError::Reopen { .. }
            | AppError::Execution { .. } => ErrorKind::Unavailable,
            AppError::Config(_)
            | AppError::File { .. }
            | AppError::Decode { .. }
            | AppError::Format { .. }
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
