//! Client error types

use thiserror::Error;

use crate::shared::{ConfigError, PollError};

/// Errors surfaced by the poll client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Protocol-level error reported by the server or the transport
    #[error(transparent)]
    Poll(#[from] PollError),

    /// Invalid client configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing the local identity file failed
    #[error("Identity store error: {0}")]
    Io(#[from] std::io::Error),

    /// The real-time channel has been shut down
    #[error("Real-time channel is closed")]
    ChannelClosed,
}

impl ClientError {
    /// The poll error inside, if this is one
    pub fn as_poll_error(&self) -> Option<&PollError> {
        match self {
            Self::Poll(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Poll(err.into())
    }
}
