/**
 * Poll Data Structures
 *
 * This module defines the poll document, its options and the request /
 * response bodies exchanged over the REST API. The same types are used
 * by the server (for storage and responses) and by the client (for
 * reconciliation), so everything here serializes with camelCase field
 * names to match the wire format.
 *
 * # Validation
 *
 * Creation input is normalised by [`validate_new_poll`]: the question and
 * every option are trimmed, empty options are dropped, and the bounds in
 * this module are enforced. Both the server and the client call it, the
 * client only to fail early.
 */
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::PollError;

/// Maximum length of a poll question, in characters
pub const MAX_QUESTION_LEN: usize = 500;

/// Maximum length of a single option, in characters
pub const MAX_OPTION_LEN: usize = 500;

/// Minimum number of non-empty options
pub const MIN_OPTIONS: usize = 2;

/// Maximum number of non-empty options
pub const MAX_OPTIONS: usize = 10;

/// Maximum length of a voter identifier
pub const MAX_VOTER_ID_LEN: usize = 128;

/// Length of a generated share id
pub const SHARE_ID_LEN: usize = 10;

/// A single selectable choice within a poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollOption {
    /// Display text
    pub text: String,
    /// Running vote count, never decreases
    pub votes: u64,
}

impl PollOption {
    /// Create an option with zero votes
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            votes: 0,
        }
    }
}

/// A poll document
///
/// Everything except the option vote counts (and therefore `total_votes`)
/// is fixed at creation time.
///
/// # Fields
/// * `id` - Internal identifier
/// * `share_id` - Public identifier used in URLs and room names
/// * `question` - The question text
/// * `options` - Ordered options, 2 to 10 entries
/// * `total_votes` - Always equal to the sum of `options[i].votes`
/// * `created_at` - Creation time (UTC)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub share_id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub total_votes: u64,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Build a fresh poll from already validated input
    pub fn new(share_id: String, input: NewPoll) -> Self {
        Self {
            id: Uuid::new_v4(),
            share_id,
            question: input.question,
            options: input.options.into_iter().map(PollOption::new).collect(),
            total_votes: 0,
            created_at: Utc::now(),
        }
    }

    /// Resolve a wire option index against this poll
    ///
    /// Negative and out-of-range indices are both rejected with
    /// [`PollError::InvalidOption`].
    pub fn option_position(&self, option_index: i64) -> Result<usize, PollError> {
        usize::try_from(option_index)
            .ok()
            .filter(|idx| *idx < self.options.len())
            .ok_or_else(|| PollError::invalid_option(option_index, self.options.len()))
    }

    /// Record one vote for the option at `position`
    ///
    /// Callers must have validated `position` and must hold whatever lock
    /// serializes votes for this poll.
    pub fn record_vote(&mut self, position: usize) {
        if let Some(option) = self.options.get_mut(position) {
            option.votes += 1;
            self.total_votes += 1;
        }
    }

    /// Sum of the per-option counts
    pub fn counted_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }

    /// The live-results view of this poll
    pub fn snapshot(&self) -> PollSnapshot {
        PollSnapshot {
            share_id: self.share_id.clone(),
            options: self.options.clone(),
            total_votes: self.total_votes,
        }
    }

    /// Overwrite the vote counts from a pushed snapshot
    ///
    /// Option text is kept from the local copy; only counts move.
    pub fn apply_snapshot(&mut self, snapshot: &PollSnapshot) {
        for (option, pushed) in self.options.iter_mut().zip(snapshot.options.iter()) {
            option.votes = pushed.votes;
        }
        self.total_votes = snapshot.total_votes;
    }
}

/// Current counts of a poll, as pushed over the real-time channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    pub share_id: String,
    pub options: Vec<PollOption>,
    pub total_votes: u64,
}

/// Validated poll creation input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
}

/// Body of `POST /api/polls`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
}

/// Response of `POST /api/polls`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePollResponse {
    pub poll: Poll,
}

/// Query string of `GET /api/polls/{shareId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPollQuery {
    pub voter_id: Option<String>,
}

/// Response of `GET /api/polls/{shareId}`
///
/// `voted_option_index` is only present when `has_voted` is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetPollResponse {
    pub poll: Poll,
    pub has_voted: bool,
    pub voted_option_index: Option<i64>,
}

/// Body of `POST /api/polls/{shareId}/vote`
///
/// The index is signed on the wire so that a negative value reaches the
/// repository and is reported as an invalid option rather than a parse
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub option_index: i64,
    pub voter_id: String,
}

/// Response of a successful vote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub poll: Poll,
    pub voted_option_index: i64,
}

/// Trim and bound-check poll creation input
///
/// # Errors
///
/// [`PollError::Validation`] with field `question` or `options`.
pub fn validate_new_poll(question: &str, options: &[String]) -> Result<NewPoll, PollError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(PollError::validation("question", "Question is required"));
    }
    if question.chars().count() > MAX_QUESTION_LEN {
        return Err(PollError::validation(
            "question",
            format!("Question must be at most {} characters", MAX_QUESTION_LEN),
        ));
    }

    let options: Vec<String> = options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
        return Err(PollError::validation(
            "options",
            format!(
                "A poll needs between {} and {} options, got {}",
                MIN_OPTIONS,
                MAX_OPTIONS,
                options.len()
            ),
        ));
    }
    if options.iter().any(|o| o.chars().count() > MAX_OPTION_LEN) {
        return Err(PollError::validation(
            "options",
            format!("Options must be at most {} characters", MAX_OPTION_LEN),
        ));
    }

    Ok(NewPoll {
        question: question.to_string(),
        options,
    })
}

/// Check a voter identifier presented with a vote
pub fn validate_voter_id(voter_id: &str) -> Result<(), PollError> {
    if voter_id.trim().is_empty() {
        return Err(PollError::validation("voterId", "Voter id is required"));
    }
    if voter_id.chars().count() > MAX_VOTER_ID_LEN {
        return Err(PollError::validation(
            "voterId",
            format!("Voter id must be at most {} characters", MAX_VOTER_ID_LEN),
        ));
    }
    Ok(())
}

/// Generate a new share id
///
/// Share ids double as capability tokens, so they come from the thread
/// local CSPRNG rather than a counter or timestamp.
pub fn generate_share_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_ID_LEN)
        .map(char::from)
        .collect()
}
