/**
 * In-Memory Poll Store
 *
 * Polls live in a map from share id to a per-poll entry. Each entry sits
 * behind its own `tokio::sync::Mutex`, so votes on different polls never
 * contend while the duplicate check, the voter insert and the counter
 * increments for one poll happen as a single step.
 *
 * The outer map lock is only held long enough to clone an entry handle.
 */
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::shared::error::PollError;
use crate::shared::poll::{
    generate_share_id, validate_new_poll, validate_voter_id, GetPollResponse, Poll, PollSnapshot,
};

use super::repository::VoteOutcome;

/// A voter's single vote on a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterRecord {
    pub option_index: i64,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug)]
struct PollEntry {
    poll: Poll,
    voters: HashMap<String, VoterRecord>,
}

/// Poll store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPollStore {
    polls: Arc<RwLock<HashMap<String, Arc<Mutex<PollEntry>>>>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of polls stored
    pub async fn len(&self) -> usize {
        self.polls.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn entry(&self, share_id: &str) -> Result<Arc<Mutex<PollEntry>>, PollError> {
        self.polls
            .read()
            .await
            .get(share_id)
            .cloned()
            .ok_or_else(|| PollError::not_found(share_id))
    }

    pub async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, PollError> {
        let input = validate_new_poll(question, options)?;

        let mut polls = self.polls.write().await;
        let mut share_id = generate_share_id();
        while polls.contains_key(&share_id) {
            tracing::warn!("[Polls] Share id collision on {}, regenerating", share_id);
            share_id = generate_share_id();
        }

        let poll = Poll::new(share_id.clone(), input);
        polls.insert(
            share_id,
            Arc::new(Mutex::new(PollEntry {
                poll: poll.clone(),
                voters: HashMap::new(),
            })),
        );
        Ok(poll)
    }

    pub async fn get_poll(
        &self,
        share_id: &str,
        voter_id: Option<&str>,
    ) -> Result<GetPollResponse, PollError> {
        let entry = self.entry(share_id).await?;
        let entry = entry.lock().await;

        let voted_option_index = voter_id
            .and_then(|voter| entry.voters.get(voter))
            .map(|record| record.option_index);

        Ok(GetPollResponse {
            poll: entry.poll.clone(),
            has_voted: voted_option_index.is_some(),
            voted_option_index,
        })
    }

    pub async fn cast_vote(
        &self,
        share_id: &str,
        option_index: i64,
        voter_id: &str,
    ) -> Result<VoteOutcome, PollError> {
        let entry = self.entry(share_id).await?;
        validate_voter_id(voter_id)?;

        let mut entry = entry.lock().await;
        let position = entry.poll.option_position(option_index)?;
        if let Some(existing) = entry.voters.get(voter_id) {
            return Err(PollError::duplicate_vote(existing.option_index));
        }

        entry.voters.insert(
            voter_id.to_string(),
            VoterRecord {
                option_index,
                voted_at: Utc::now(),
            },
        );
        entry.poll.record_vote(position);

        Ok(VoteOutcome {
            poll: entry.poll.clone(),
            voted_option_index: option_index,
        })
    }

    pub async fn snapshot(&self, share_id: &str) -> Result<PollSnapshot, PollError> {
        let entry = self.entry(share_id).await?;
        let entry = entry.lock().await;
        Ok(entry.poll.snapshot())
    }

    /// Vote record of `voter_id` on `share_id`, if any
    pub async fn voter_record(&self, share_id: &str, voter_id: &str) -> Option<VoterRecord> {
        let entry = self.entry(share_id).await.ok()?;
        let entry = entry.lock().await;
        entry.voters.get(voter_id).cloned()
    }
}
