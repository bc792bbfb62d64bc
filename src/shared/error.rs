//! Poll Error Types
//!
//! This module defines the error taxonomy shared by the server and the client.
//! Every variant has a stable wire `kind` so an error can cross the REST API or
//! the real-time channel and be rebuilt on the other side.
//!
//! # Error Categories
//!
//! - `Validation` - Bad poll-creation or vote input
//! - `NotFound` - Unknown share id
//! - `InvalidOption` - Option index out of range
//! - `DuplicateVote` - The voter already has a record for this poll. This is a
//!   reconciliation signal rather than a hard failure: it carries the voter's
//!   real prior choice.
//! - `Transport` - Channel disconnect or timeout
//! - `Serialization` - JSON encoding/decoding failures
//!
//! # Usage
//!
//! ```rust
//! use pollroom::shared::error::PollError;
//!
//! let error = PollError::validation("question", "Question is required");
//! assert_eq!(error.kind(), "validation");
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur anywhere in the poll protocol
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    /// Bad creation or vote input
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// No poll matches the share id
    #[error("Poll not found: {share_id}")]
    NotFound {
        /// The share id that was looked up
        share_id: String,
    },

    /// Option index outside `0..option_count`
    #[error("Invalid option index {option_index} (poll has {option_count} options)")]
    InvalidOption {
        option_index: i64,
        option_count: usize,
    },

    /// The voter already voted on this poll
    #[error("Already voted for option {voted_option_index}")]
    DuplicateVote {
        /// The option the voter picked the first time
        voted_option_index: i64,
    },

    /// Real-time channel or HTTP transport failure
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl PollError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(share_id: impl Into<String>) -> Self {
        Self::NotFound {
            share_id: share_id.into(),
        }
    }

    /// Create a new invalid-option error
    pub fn invalid_option(option_index: i64, option_count: usize) -> Self {
        Self::InvalidOption {
            option_index,
            option_count,
        }
    }

    /// Create a new duplicate-vote error
    pub fn duplicate_vote(voted_option_index: i64) -> Self {
        Self::DuplicateVote { voted_option_index }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Stable wire name of this error's category
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::InvalidOption { .. } => "invalid_option",
            Self::DuplicateVote { .. } => "duplicate_vote",
            Self::Transport { .. } => "transport",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// The prior choice carried by a duplicate-vote error
    pub fn voted_option_index(&self) -> Option<i64> {
        match self {
            Self::DuplicateVote { voted_option_index } => Some(*voted_option_index),
            _ => None,
        }
    }
}

/// Wire form of a [`PollError`]
///
/// Sent as the body of REST error responses and as the payload of the
/// `vote-error` / `poll-error` channel events. Only the fields relevant to
/// `kind` are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Stable category name, see [`PollError::kind`]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted_option_index: Option<i64>,
}

impl ErrorBody {
    /// Rebuild the error this body was produced from
    ///
    /// Bodies from a newer server with an unknown `kind`, or missing the
    /// fields their kind needs, degrade to a transport error carrying the
    /// message.
    pub fn into_error(self) -> PollError {
        match self.kind.as_str() {
            "validation" => PollError::validation(self.field.unwrap_or_default(), self.error),
            "not_found" => PollError::not_found(self.share_id.unwrap_or_default()),
            "invalid_option" => match (self.option_index, self.option_count) {
                (Some(index), Some(count)) => PollError::invalid_option(index, count),
                _ => PollError::transport(self.error),
            },
            "duplicate_vote" => match self.voted_option_index {
                Some(index) => PollError::duplicate_vote(index),
                None => PollError::transport(self.error),
            },
            "serialization" => PollError::serialization(self.error),
            _ => PollError::transport(self.error),
        }
    }
}

impl From<&PollError> for ErrorBody {
    fn from(err: &PollError) -> Self {
        let mut body = ErrorBody {
            error: err.to_string(),
            kind: err.kind().to_string(),
            field: None,
            share_id: None,
            option_index: None,
            option_count: None,
            voted_option_index: None,
        };
        match err {
            PollError::Validation { field, message } => {
                body.field = Some(field.clone());
                body.error = message.clone();
            }
            PollError::NotFound { share_id } => body.share_id = Some(share_id.clone()),
            PollError::InvalidOption { option_index, option_count } => {
                body.option_index = Some(*option_index);
                body.option_count = Some(*option_count);
            }
            PollError::DuplicateVote { voted_option_index } => {
                body.voted_option_index = Some(*voted_option_index);
            }
            PollError::Transport { message } | PollError::Serialization { message } => {
                body.error = message.clone();
            }
        }
        body
    }
}

impl From<serde_json::Error> for PollError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
