/**
 * Poll Service
 *
 * Ties the repository to the rooms. Both vote paths (the WebSocket `vote`
 * event and `POST /api/polls/{shareId}/vote`) go through
 * [`PollService::submit_vote`], which commits the vote and broadcasts the
 * new counts inside the poll's vote lane.
 */
use crate::backend::error::BackendError;
use crate::backend::realtime::rooms::RoomRegistry;
use crate::shared::poll::{GetPollResponse, Poll, PollSnapshot};
use crate::shared::ServerEvent;

use super::repository::{PollRepository, VoteOutcome};

/// Poll operations shared by the REST handlers and the WebSocket sessions
#[derive(Debug, Clone, Default)]
pub struct PollService {
    repository: PollRepository,
    rooms: RoomRegistry,
}

impl PollService {
    pub fn new(repository: PollRepository, rooms: RoomRegistry) -> Self {
        Self { repository, rooms }
    }

    pub fn repository(&self) -> &PollRepository {
        &self.repository
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, BackendError> {
        self.repository.create_poll(question, options).await
    }

    pub async fn get_poll(
        &self,
        share_id: &str,
        voter_id: Option<&str>,
    ) -> Result<GetPollResponse, BackendError> {
        self.repository.get_poll(share_id, voter_id).await
    }

    pub async fn snapshot(&self, share_id: &str) -> Result<PollSnapshot, BackendError> {
        self.repository.snapshot(share_id).await
    }

    /// Commit a vote and broadcast `poll-updated` to the poll's room
    ///
    /// The lane guard is dropped only after the broadcast send, so
    /// broadcasts leave in commit order. A rejected vote broadcasts
    /// nothing.
    pub async fn submit_vote(
        &self,
        share_id: &str,
        option_index: i64,
        voter_id: &str,
    ) -> Result<VoteOutcome, BackendError> {
        let lane = self.rooms.vote_lane(share_id);
        let _turn = lane.lock().await;

        let outcome = self.repository.cast_vote(share_id, option_index, voter_id).await?;
        let viewers = self
            .rooms
            .broadcast(share_id, ServerEvent::PollUpdated(outcome.poll.snapshot()));
        tracing::debug!(
            "[Polls] Vote on {} committed, update sent to {} viewers",
            share_id,
            viewers
        );
        Ok(outcome)
    }
}
