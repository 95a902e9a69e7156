//! Error types for mediabox-server
//!
//! Every error maps onto a structured JSON failure `{success: false, message}`
//! so nothing raised inside a handler escapes as an unformatted response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// Message returned for any request whose (category, path) is not registered
pub const INVALID_ACTION_MESSAGE: &str = "Invalid API action";

/// Main error type for mediabox-server
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors raised by the shared configuration loader
    #[error(transparent)]
    Common(#[from] mediabox_common::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Remote download errors
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No category with this name is registered
    #[error("Category \"{0}\" not found")]
    UnknownCategory(String),

    /// The category exists but has no action at this path
    #[error("Path \"{path}\" not found under category \"{category}\"")]
    UnknownPath { category: String, path: String },

    /// Two actions were registered under the same (category, path)
    #[error("Duplicate action registration for {category}/{path}")]
    DuplicateAction { category: String, path: String },

    /// Audio player errors
    #[error("Player error: {0}")]
    Player(String),

    /// Bluetooth collaborator errors
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),

    /// Service manager errors
    #[error("Service control error: {0}")]
    Service(String),

    /// An action did not finish within its time limit
    #[error("Action timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using mediabox-server Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) | Error::UnknownCategory(_) | Error::UnknownPath { .. } => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for lookup failures in the action table
    pub fn is_routing(&self) -> bool {
        matches!(self, Error::UnknownCategory(_) | Error::UnknownPath { .. })
    }

    /// Human-readable message placed in the response body
    ///
    /// Request-level errors carry their own text; handler failures whose
    /// message was chosen by the handler are reported verbatim.
    pub fn public_message(&self) -> String {
        match self {
            Error::UnknownCategory(_) | Error::UnknownPath { .. } => {
                INVALID_ACTION_MESSAGE.to_string()
            }
            Error::BadRequest(msg)
            | Error::NotFound(msg)
            | Error::Player(msg)
            | Error::Bluetooth(msg)
            | Error::Service(msg)
            | Error::Internal(msg) => msg.clone(),
            Error::Timeout(_) => "Action timed out".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let body = if self.is_routing() {
            json!({
                "success": false,
                "message": self.public_message(),
                "reason": self.to_string(),
            })
        } else {
            json!({
                "success": false,
                "message": self.public_message(),
            })
        };

        (status, Json(body)).into_response()
    }
}
