/**
 * Poll Session
 *
 * Drives one poll page end to end: joins the room, loads the REST
 * snapshot, feeds channel events through the [`PollView`] reducer and runs
 * the effects it returns against the REST client, the channel and the
 * voter identity store.
 *
 * # Vote Path
 *
 * A vote goes over the real-time channel when it is connected. When it is
 * not, the same vote goes over REST instead, and the REST answer is fed
 * back into the reducer as if it had arrived on the channel. A single vote
 * never uses both paths.
 */
use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::api::PollApiClient;
use crate::client::channel::{ChannelEvent, PollChannel, RoomMembership};
use crate::client::error::ClientError;
use crate::client::identity::VoterStore;
use crate::client::reconcile::{Effect, PollView, ViewAction};
use crate::shared::event::{PollRejection, VoteAccepted};
use crate::shared::{ServerEvent, VoteIntent};

/// One open poll page
pub struct PollSession {
    // Declared before `channel` so the leave is queued before the channel goes.
    membership: Option<RoomMembership>,
    channel: PollChannel,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    api: PollApiClient,
    store: Arc<VoterStore>,
    voter_id: String,
    view: PollView,
}

impl std::fmt::Debug for PollSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollSession")
            .field("share_id", &self.view.share_id())
            .field("channel", &self.channel)
            .finish()
    }
}

impl PollSession {
    /// Join the poll's room and load its snapshot
    ///
    /// The room is joined first so no update committed after the snapshot
    /// is missed.
    pub async fn open(
        api: PollApiClient,
        channel: PollChannel,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
        store: Arc<VoterStore>,
        share_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let share_id = share_id.into();
        let voter_id = store.voter_id()?;
        let membership = channel.join(share_id.clone())?;

        let mut session = Self {
            membership: Some(membership),
            channel,
            events,
            api,
            store,
            voter_id,
            view: PollView::new(share_id),
        };
        session.refresh().await?;
        Ok(session)
    }

    pub fn view(&self) -> &PollView {
        &self.view
    }

    pub fn voter_id(&self) -> &str {
        &self.voter_id
    }

    pub fn channel(&self) -> &PollChannel {
        &self.channel
    }

    /// Reload the REST snapshot
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let share_id = self.view.share_id().to_string();
        match self.api.get_poll(&share_id, Some(&self.voter_id)).await {
            Ok(response) => {
                let local_vote = self.store.has_voted_on_poll(&share_id);
                self.dispatch(ViewAction::SnapshotLoaded { response, local_vote }).await
            }
            Err(error) => {
                self.dispatch(ViewAction::SnapshotFailed(error.clone())).await?;
                Err(error.into())
            }
        }
    }

    /// Select an option
    pub async fn select(&mut self, option: usize) -> Result<(), ClientError> {
        self.dispatch(ViewAction::Select(option)).await
    }

    /// Submit the selected option
    pub async fn submit_vote(&mut self) -> Result<(), ClientError> {
        self.dispatch(ViewAction::SubmitVote).await
    }

    /// Wait for the next channel event and apply it
    ///
    /// Returns `None` once the channel has shut down.
    pub async fn next_event(&mut self) -> Option<Result<ChannelEvent, ClientError>> {
        let event = self.events.recv().await?;
        let action = match &event {
            ChannelEvent::Connected => ViewAction::ConnectionRestored,
            ChannelEvent::Disconnected { .. } => ViewAction::ConnectionLost,
            ChannelEvent::Server(server_event) => ViewAction::Server(server_event.clone()),
        };
        Some(self.dispatch(action).await.map(|()| event))
    }

    /// Leave the room and shut the channel down
    pub async fn close(mut self) {
        if let Some(membership) = self.membership.take() {
            membership.leave();
        }
        self.channel.shutdown().await;
    }

    /// Apply an action and run every effect it produces
    async fn dispatch(&mut self, action: ViewAction) -> Result<(), ClientError> {
        let mut effects: VecDeque<Effect> = self.view.apply(action).into();

        while let Some(effect) = effects.pop_front() {
            match effect {
                // The local record is advisory; a failed write must not hold back the vote.
                Effect::PersistLocalVote { share_id, option_index } => {
                    if let Err(e) = self.store.mark_poll_as_voted(&share_id, option_index) {
                        tracing::warn!("[Session] Could not record vote on {} locally: {}", share_id, e);
                    }
                }
                Effect::ForgetLocalVote { share_id } => {
                    if let Err(e) = self.store.forget_poll(&share_id) {
                        tracing::warn!("[Session] Could not forget local vote on {}: {}", share_id, e);
                    }
                }
                Effect::RefreshSnapshot { share_id } => {
                    match self.api.get_poll(&share_id, Some(&self.voter_id)).await {
                        Ok(response) => {
                            let local_vote = self.store.has_voted_on_poll(&share_id);
                            effects.extend(self.view.apply(ViewAction::SnapshotLoaded { response, local_vote }));
                        }
                        Err(error) => {
                            tracing::warn!("[Session] Refresh of {} failed: {}", share_id, error);
                            effects.extend(self.view.apply(ViewAction::SnapshotFailed(error)));
                        }
                    }
                }
                Effect::EmitVote { share_id, option_index } => {
                    for action in self.emit_vote(share_id, option_index).await {
                        effects.extend(self.view.apply(action));
                    }
                }
            }
        }
        Ok(())
    }

    /// Send a vote, over the channel when possible and REST otherwise
    ///
    /// Returns the actions to apply immediately; a channel vote is answered
    /// later by a server event.
    async fn emit_vote(&mut self, share_id: String, option_index: i64) -> Vec<ViewAction> {
        let intent = VoteIntent {
            share_id: share_id.clone(),
            option_index,
            voter_id: self.voter_id.clone(),
        };

        match self.channel.vote(intent) {
            Ok(()) => return Vec::new(),
            Err(e) => tracing::debug!("[Session] Channel vote unavailable ({}), using REST", e),
        }

        match self.api.vote(&share_id, option_index, &self.voter_id).await {
            Ok(response) => vec![
                ViewAction::Server(ServerEvent::PollUpdated(response.poll.snapshot())),
                ViewAction::Server(ServerEvent::VoteSuccess(VoteAccepted {
                    share_id,
                    voted_option_index: response.voted_option_index,
                })),
            ],
            Err(error) => vec![ViewAction::Server(ServerEvent::VoteError(PollRejection::new(
                share_id, &error,
            )))],
        }
    }
}
