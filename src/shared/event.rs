/**
 * Real-time Channel Events
 *
 * This module defines the events exchanged over the poll room channel.
 * Every frame is a JSON object of the form `{"event": "<name>", "data": ...}`
 * with kebab-case event names, so the same stream can be read by any
 * client that speaks the room protocol.
 *
 * # Client to server
 *
 * - `join-poll` - start receiving a poll's updates
 * - `leave-poll` - stop receiving them
 * - `vote` - cast a vote
 *
 * # Server to client
 *
 * - `poll-updated` - room broadcast after every committed vote
 * - `poll-data` - snapshot pushed to a session right after it joins
 * - `viewer-count` - room broadcast on every join and leave
 * - `vote-success` / `vote-error` - acknowledgment to the voting session only
 * - `poll-error` - join refused because the poll does not exist
 * - `protocol-error` - a frame could not be understood
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::{ErrorBody, PollError};
use crate::shared::poll::PollSnapshot;

/// Payload of the `vote` event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteIntent {
    pub share_id: String,
    pub option_index: i64,
    pub voter_id: String,
}

/// Event sent by a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join the room of the given share id
    JoinPoll(String),
    /// Leave the room of the given share id
    LeavePoll(String),
    /// Cast a vote
    Vote(VoteIntent),
}

/// Payload of the `viewer-count` event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCount {
    pub share_id: String,
    pub count: usize,
}

/// Payload of the `vote-success` event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteAccepted {
    pub share_id: String,
    pub voted_option_index: i64,
}

/// Payload of the `vote-error` and `poll-error` events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollRejection {
    pub share_id: String,
    #[serde(flatten)]
    pub body: ErrorBody,
}

impl PollRejection {
    /// Wrap a repository error for the given poll
    ///
    /// The rejection's own `shareId` is the only one on the wire; a
    /// not-found body is rebuilt from it by [`PollRejection::error`].
    pub fn new(share_id: impl Into<String>, error: &PollError) -> Self {
        let mut body = ErrorBody::from(error);
        body.share_id = None;
        Self {
            share_id: share_id.into(),
            body,
        }
    }

    /// The prior choice carried by a duplicate-vote rejection
    pub fn voted_option_index(&self) -> Option<i64> {
        self.body.voted_option_index
    }

    /// Rebuild the error that caused this rejection
    pub fn error(&self) -> PollError {
        let mut body = self.body.clone();
        if body.share_id.is_none() {
            body.share_id = Some(self.share_id.clone());
        }
        body.into_error()
    }
}

/// Payload of the `protocol-error` event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtocolError {
    pub error: String,
}

/// Event sent by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// New counts after a committed vote (room broadcast)
    PollUpdated(PollSnapshot),
    /// Counts pushed to a session right after it joined
    PollData(PollSnapshot),
    /// Number of sessions currently in the room (room broadcast)
    ViewerCount(ViewerCount),
    /// The session's vote was committed
    VoteSuccess(VoteAccepted),
    /// The session's vote was refused
    VoteError(PollRejection),
    /// The session tried to join a poll that does not exist
    PollError(PollRejection),
    /// The session sent a frame the server could not parse
    ProtocolError(ProtocolError),
}

impl ServerEvent {
    /// Share id this event is about, if any
    pub fn share_id(&self) -> Option<&str> {
        match self {
            Self::PollUpdated(s) | Self::PollData(s) => Some(&s.share_id),
            Self::ViewerCount(v) => Some(&v.share_id),
            Self::VoteSuccess(v) => Some(&v.share_id),
            Self::VoteError(r) | Self::PollError(r) => Some(&r.share_id),
            Self::ProtocolError(_) => None,
        }
    }

    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::PollUpdated(_) => "poll-updated",
            Self::PollData(_) => "poll-data",
            Self::ViewerCount(_) => "viewer-count",
            Self::VoteSuccess(_) => "vote-success",
            Self::VoteError(_) => "vote-error",
            Self::PollError(_) => "poll-error",
            Self::ProtocolError(_) => "protocol-error",
        }
    }

    /// Build a `vote-error` event
    pub fn vote_error(share_id: impl Into<String>, error: &PollError) -> Self {
        Self::VoteError(PollRejection::new(share_id, error))
    }

    /// Build a `viewer-count` event
    pub fn viewer_count(share_id: impl Into<String>, count: usize) -> Self {
        Self::ViewerCount(ViewerCount {
            share_id: share_id.into(),
            count,
        })
    }
}
