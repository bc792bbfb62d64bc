/**
 * Poll Repository
 *
 * The single entry point for poll storage. A repository is either the
 * in-memory store (the default, and what tests use) or the PostgreSQL
 * store (when `DATABASE_URL` is set and reachable). Both enforce the same
 * rules:
 *
 * - creation input is trimmed and bound-checked
 * - a vote is checked, recorded and counted as one atomic step per poll
 * - a voter has at most one vote per poll; a second attempt is answered
 *   with the first choice and changes nothing
 *
 * The repository never retries a vote.
 */
use crate::backend::error::BackendError;
use crate::shared::poll::{GetPollResponse, Poll, PollSnapshot};

use super::memory::MemoryPollStore;
use super::postgres::PgPollStore;

/// Result of a committed vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// The poll after the vote was counted
    pub poll: Poll,
    /// The option the vote went to
    pub voted_option_index: i64,
}

/// Poll storage backend
#[derive(Debug, Clone)]
pub enum PollRepository {
    Memory(MemoryPollStore),
    Postgres(PgPollStore),
}

impl Default for PollRepository {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl PollRepository {
    /// Empty in-memory repository
    pub fn in_memory() -> Self {
        Self::Memory(MemoryPollStore::new())
    }

    /// Repository backed by a PostgreSQL pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::Postgres(PgPollStore::new(pool))
    }

    /// Short name for logs
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Validate input and store a new poll with zero votes
    pub async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, BackendError> {
        let poll = match self {
            Self::Memory(store) => store.create_poll(question, options).await?,
            Self::Postgres(store) => store.create_poll(question, options).await?,
        };
        tracing::info!(
            "[Polls] Created poll {} with {} options",
            poll.share_id,
            poll.options.len()
        );
        Ok(poll)
    }

    /// Fetch a poll, with the caller's vote if `voter_id` is given
    pub async fn get_poll(
        &self,
        share_id: &str,
        voter_id: Option<&str>,
    ) -> Result<GetPollResponse, BackendError> {
        match self {
            Self::Memory(store) => Ok(store.get_poll(share_id, voter_id).await?),
            Self::Postgres(store) => store.get_poll(share_id, voter_id).await,
        }
    }

    /// Record one vote
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation` (voter id), `InvalidOption`, or
    /// `DuplicateVote` carrying the voter's earlier choice. None of them
    /// mutate the poll.
    pub async fn cast_vote(
        &self,
        share_id: &str,
        option_index: i64,
        voter_id: &str,
    ) -> Result<VoteOutcome, BackendError> {
        let outcome = match self {
            Self::Memory(store) => store.cast_vote(share_id, option_index, voter_id).await?,
            Self::Postgres(store) => store.cast_vote(share_id, option_index, voter_id).await?,
        };
        tracing::debug!(
            "[Polls] Vote on {} for option {} (total {})",
            share_id,
            option_index,
            outcome.poll.total_votes
        );
        Ok(outcome)
    }

    /// Current counts of a poll
    pub async fn snapshot(&self, share_id: &str) -> Result<PollSnapshot, BackendError> {
        match self {
            Self::Memory(store) => Ok(store.snapshot(share_id).await?),
            Self::Postgres(store) => store.snapshot(share_id).await,
        }
    }
}
