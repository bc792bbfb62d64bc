//! # Poll View Reconciliation
//!
//! Client-side state of one poll page, driven by a reducer. Every input
//! (the REST snapshot, the user's selection, server events, connection
//! changes) is a [`ViewAction`]; [`PollView::apply`] updates the state and
//! returns the side effects the caller must run.
//!
//! ## Rules
//!
//! - Pushed counts (`poll-updated`, `poll-data`) replace the local counts.
//! - A vote is optimistic: `SubmitVote` emits the vote and a local record
//!   at once, and the server's answer confirms or corrects it.
//! - A duplicate-vote answer is not a failure: the view adopts the
//!   server's recorded choice and rewrites the local record to match.
//! - Any other refusal removes the optimistic local record.
//!
//! ## Usage
//!
//! ```rust
//! use pollroom::client::reconcile::{PollView, ViewAction};
//!
//! let mut view = PollView::new("aB3dE5fG7h");
//! let effects = view.apply(ViewAction::Select(0));
//! assert!(effects.is_empty());
//! ```

use crate::client::identity::LocalVote;
use crate::shared::poll::{GetPollResponse, Poll, PollSnapshot};
use crate::shared::{PollError, ServerEvent};

/// Notice shown when the server reports an earlier vote
pub const ALREADY_VOTED_NOTICE: &str = "You have already voted on this poll";

/// Connection status as seen by the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been established yet
    Connecting,
    Connected,
    /// The connection dropped and is being re-established
    Reconnecting,
}

/// Inputs to the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    /// The REST snapshot arrived
    SnapshotLoaded {
        response: GetPollResponse,
        local_vote: Option<LocalVote>,
    },
    /// The REST snapshot failed
    SnapshotFailed(PollError),
    /// The user picked an option
    Select(usize),
    /// The user submitted the selected option
    SubmitVote,
    /// The server pushed an event
    Server(ServerEvent),
    ConnectionLost,
    ConnectionRestored,
}

/// Side effects requested by the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the local vote record
    PersistLocalVote { share_id: String, option_index: i64 },
    /// Delete the local vote record
    ForgetLocalVote { share_id: String },
    /// Send the vote to the server
    EmitVote { share_id: String, option_index: i64 },
    /// Fetch a fresh REST snapshot
    RefreshSnapshot { share_id: String },
}

/// State of one poll page
#[derive(Debug, Clone, PartialEq)]
pub struct PollView {
    share_id: String,
    poll: Option<Poll>,
    /// Counts pushed before the REST snapshot arrived
    early_counts: Option<PollSnapshot>,
    has_voted: bool,
    voted_option_index: Option<i64>,
    selected_option: Option<usize>,
    pending_vote: Option<i64>,
    viewer_count: Option<usize>,
    connection: ConnectionState,
    notice: Option<String>,
    error: Option<PollError>,
}

impl PollView {
    pub fn new(share_id: impl Into<String>) -> Self {
        Self {
            share_id: share_id.into(),
            poll: None,
            early_counts: None,
            has_voted: false,
            voted_option_index: None,
            selected_option: None,
            pending_vote: None,
            viewer_count: None,
            connection: ConnectionState::Connecting,
            notice: None,
            error: None,
        }
    }

    pub fn share_id(&self) -> &str {
        &self.share_id
    }

    pub fn poll(&self) -> Option<&Poll> {
        self.poll.as_ref()
    }

    pub fn has_voted(&self) -> bool {
        self.has_voted
    }

    pub fn voted_option_index(&self) -> Option<i64> {
        self.voted_option_index
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn pending_vote(&self) -> Option<i64> {
        self.pending_vote
    }

    pub fn viewer_count(&self) -> Option<usize> {
        self.viewer_count
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn error(&self) -> Option<&PollError> {
        self.error.as_ref()
    }

    /// Whether the user may pick and submit an option right now
    pub fn can_vote(&self) -> bool {
        self.poll.is_some() && !self.has_voted && self.pending_vote.is_none()
    }

    /// Apply one action and return the effects to run
    pub fn apply(&mut self, action: ViewAction) -> Vec<Effect> {
        match action {
            ViewAction::SnapshotLoaded { response, local_vote } => {
                self.load_snapshot(response, local_vote);
                Vec::new()
            }
            ViewAction::SnapshotFailed(error) => {
                self.error = Some(error);
                Vec::new()
            }
            ViewAction::Select(index) => {
                let in_range = self.poll.as_ref().is_some_and(|p| index < p.options.len());
                if self.can_vote() && in_range {
                    self.selected_option = Some(index);
                    self.error = None;
                }
                Vec::new()
            }
            ViewAction::SubmitVote => self.submit_vote(),
            ViewAction::Server(event) => self.apply_server_event(event),
            ViewAction::ConnectionLost => {
                self.connection = ConnectionState::Reconnecting;
                if self.pending_vote.take().is_some() {
                    self.error = Some(PollError::transport(
                        "Connection lost before the vote was confirmed",
                    ));
                }
                Vec::new()
            }
            ViewAction::ConnectionRestored => {
                let previous = std::mem::replace(&mut self.connection, ConnectionState::Connected);
                if previous == ConnectionState::Reconnecting {
                    vec![Effect::RefreshSnapshot {
                        share_id: self.share_id.clone(),
                    }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn load_snapshot(&mut self, response: GetPollResponse, local_vote: Option<LocalVote>) {
        let mut poll = response.poll;

        // Counts only grow, so the higher total is the more recent view.
        let newer = [self.poll.as_ref().map(|p| p.snapshot()), self.early_counts.take()]
            .into_iter()
            .flatten()
            .filter(|s| s.options.len() == poll.options.len())
            .max_by_key(|s| s.total_votes);
        if let Some(snapshot) = newer {
            if snapshot.total_votes > poll.total_votes {
                poll.apply_snapshot(&snapshot);
            }
        }
        self.poll = Some(poll);
        self.error = None;

        if response.has_voted {
            self.has_voted = true;
            self.voted_option_index = response.voted_option_index;
            self.pending_vote = None;
        } else if let Some(local) = local_vote {
            self.has_voted = true;
            self.voted_option_index = Some(local.option_index);
        }
        if let Some(index) = self.voted_option_index {
            self.selected_option = usize::try_from(index).ok();
        }
    }

    fn submit_vote(&mut self) -> Vec<Effect> {
        let Some(index) = self.selected_option else {
            return Vec::new();
        };
        if !self.can_vote() {
            return Vec::new();
        }

        let option_index = index as i64;
        self.pending_vote = Some(option_index);
        self.notice = None;
        self.error = None;
        vec![
            Effect::PersistLocalVote {
                share_id: self.share_id.clone(),
                option_index,
            },
            Effect::EmitVote {
                share_id: self.share_id.clone(),
                option_index,
            },
        ]
    }

    fn apply_server_event(&mut self, event: ServerEvent) -> Vec<Effect> {
        if let ServerEvent::ProtocolError(protocol) = &event {
            self.error = Some(PollError::serialization(protocol.error.clone()));
            return Vec::new();
        }
        if event.share_id() != Some(self.share_id.as_str()) {
            return Vec::new();
        }

        match event {
            ServerEvent::PollUpdated(snapshot) => {
                self.apply_counts(snapshot, false);
                Vec::new()
            }
            ServerEvent::PollData(snapshot) => {
                self.apply_counts(snapshot, true);
                Vec::new()
            }
            ServerEvent::ViewerCount(viewers) => {
                self.viewer_count = Some(viewers.count);
                Vec::new()
            }
            ServerEvent::VoteSuccess(ack) => {
                self.pending_vote = None;
                self.has_voted = true;
                self.voted_option_index = Some(ack.voted_option_index);
                self.selected_option = usize::try_from(ack.voted_option_index).ok();
                Vec::new()
            }
            ServerEvent::VoteError(rejection) => {
                self.pending_vote = None;
                match rejection.voted_option_index() {
                    Some(index) => {
                        self.has_voted = true;
                        self.voted_option_index = Some(index);
                        self.selected_option = usize::try_from(index).ok();
                        self.notice = Some(ALREADY_VOTED_NOTICE.to_string());
                        vec![Effect::PersistLocalVote {
                            share_id: self.share_id.clone(),
                            option_index: index,
                        }]
                    }
                    None => {
                        self.error = Some(rejection.error());
                        if self.has_voted {
                            Vec::new()
                        } else {
                            vec![Effect::ForgetLocalVote {
                                share_id: self.share_id.clone(),
                            }]
                        }
                    }
                }
            }
            ServerEvent::PollError(rejection) => {
                self.error = Some(rejection.error());
                Vec::new()
            }
            ServerEvent::ProtocolError(_) => Vec::new(),
        }
    }

    fn apply_counts(&mut self, snapshot: PollSnapshot, buffer_early: bool) {
        match self.poll.as_mut() {
            Some(poll) if poll.options.len() == snapshot.options.len() => {
                poll.apply_snapshot(&snapshot);
            }
            Some(poll) => {
                tracing::warn!(
                    "[View] Ignoring counts for {} with {} options (poll has {})",
                    snapshot.share_id,
                    snapshot.options.len(),
                    poll.options.len()
                );
            }
            None if buffer_early => self.early_counts = Some(snapshot),
            None => {}
        }
    }
}
