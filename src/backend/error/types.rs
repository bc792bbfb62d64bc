/**
 * Backend Error Types
 *
 * This module defines error types specific to the poll server.
 * These errors are returned by the repository, the vote service and the
 * HTTP handlers, and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Poll Errors
 *
 * Protocol-level outcomes shared with clients (validation, not found,
 * invalid option, duplicate vote). They are surfaced verbatim as a kind
 * plus message.
 *
 * ## Database Errors
 *
 * Failures talking to PostgreSQL. These are logged in full and reported
 * to clients as a generic internal error.
 *
 * ## Handler Errors
 *
 * Request-shape problems detected in a handler before the repository is
 * reached (malformed body or query, unknown route), plus server-side
 * failures with a specific status. Clients see 4xx handler errors as
 * validation errors and everything else as transport errors.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::PollError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use pollroom::backend::error::BackendError;
/// use pollroom::shared::PollError;
///
/// let err: BackendError = PollError::not_found("abc").into();
/// assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Poll protocol error (validation, not found, invalid option, duplicate vote)
    #[error(transparent)]
    Poll(#[from] PollError),

    /// Database error
    ///
    /// Only produced by the PostgreSQL-backed repository.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Handler error (e.g., malformed path or query)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// The poll error inside, if this is one
    pub fn as_poll_error(&self) -> Option<&PollError> {
        match self {
            Self::Poll(err) => Some(err),
            _ => None,
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Validation` / `InvalidOption` - 400 Bad Request
    /// - `NotFound` - 404 Not Found
    /// - `DuplicateVote` - 409 Conflict
    /// - `Transport` - 502 Bad Gateway
    /// - `Serialization` / `Database` / `SerializationError` - 500
    /// - `HandlerError` - Uses the status code from the error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Poll(err) => match err {
                PollError::Validation { .. } => StatusCode::BAD_REQUEST,
                PollError::InvalidOption { .. } => StatusCode::BAD_REQUEST,
                PollError::NotFound { .. } => StatusCode::NOT_FOUND,
                PollError::DuplicateVote { .. } => StatusCode::CONFLICT,
                PollError::Transport { .. } => StatusCode::BAD_GATEWAY,
                PollError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::HandlerError { status, .. } => *status,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the error a client should see
    ///
    /// Internal failures are replaced by a generic transport error so that
    /// database details never leave the server.
    pub fn to_client_error(&self) -> PollError {
        match self {
            Self::Poll(err) => err.clone(),
            Self::HandlerError { status, message } if status.is_client_error() => {
                PollError::validation("request", message.clone())
            }
            Self::HandlerError { message, .. } => PollError::transport(message.clone()),
            Self::Database(_) | Self::SerializationError(_) => {
                PollError::transport("Internal server error")
            }
        }
    }
}
