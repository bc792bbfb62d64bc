/**
 * WebSocket Session
 *
 * Handles `GET /ws`. Each connection runs one session task that selects
 * over two sources:
 *
 * - inbound frames from the client (`join-poll`, `leave-poll`, `vote`)
 * - the session's outbound queue, fed by unicast replies and by one
 *   forwarder task per joined room
 *
 * # Room Membership
 *
 * The session owns the map of rooms it has joined. Every join gets a new
 * generation number, and forwarded room events carry it. When the session
 * leaves a room the forwarder is aborted and the entry removed, so any of
 * that room's events still sitting in the queue are dropped instead of
 * delivered. Closing the socket leaves every room the session was in.
 */
use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::polls::PollService;
use crate::shared::event::{PollRejection, ProtocolError, VoteAccepted};
use crate::shared::{ClientEvent, PollError, ServerEvent, VoteIntent};

use super::rooms::SessionId;

/// An event waiting to be written to the socket
#[derive(Debug)]
struct Outbound {
    /// Room and join generation for forwarded room events, `None` for replies
    room: Option<(String, u64)>,
    event: ServerEvent,
}

impl Outbound {
    fn reply(event: ServerEvent) -> Self {
        Self { room: None, event }
    }
}

struct JoinedRoom {
    generation: u64,
    forwarder: JoinHandle<()>,
}

/// Handle `GET /ws`
pub async fn handle_ws_upgrade(State(service): State<PollService>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_session(service, socket))
}

/// State owned by one connection's task
struct PollSession {
    id: SessionId,
    service: PollService,
    outbound: mpsc::UnboundedSender<Outbound>,
    joined: HashMap<String, JoinedRoom>,
    next_generation: u64,
}

async fn run_session(service: PollService, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut queue) = mpsc::unbounded_channel::<Outbound>();
    let mut session = PollSession {
        id: Uuid::new_v4(),
        service,
        outbound,
        joined: HashMap::new(),
        next_generation: 0,
    };
    tracing::info!("[Channel] Session {} connected", session.id);

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => session.handle_frame(text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("[Channel] Session {} read error: {}", session.id, e);
                    break;
                }
            },
            Some(outbound) = queue.recv() => {
                if !session.should_deliver(&outbound) {
                    continue;
                }
                let text = match serde_json::to_string(&outbound.event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("[Channel] Failed to encode {}: {}", outbound.event.name(), e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    session.leave_all();
    tracing::info!("[Channel] Session {} disconnected", session.id);
}

impl PollSession {
    fn reply(&self, event: ServerEvent) {
        let _ = self.outbound.send(Outbound::reply(event));
    }

    /// Room events are only delivered while the same join is still active
    fn should_deliver(&self, outbound: &Outbound) -> bool {
        match &outbound.room {
            None => true,
            Some((share_id, generation)) => self
                .joined
                .get(share_id)
                .is_some_and(|room| room.generation == *generation),
        }
    }

    async fn handle_frame(&mut self, text: &str) {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!("[Channel] Session {} sent an unreadable frame: {}", self.id, e);
                self.reply(ServerEvent::ProtocolError(ProtocolError {
                    error: format!("Unrecognized frame: {}", e),
                }));
                return;
            }
        };

        match event {
            ClientEvent::JoinPoll(share_id) => self.join(share_id).await,
            ClientEvent::LeavePoll(share_id) => self.leave(&share_id),
            ClientEvent::Vote(intent) => self.vote(intent).await,
        }
    }

    async fn join(&mut self, share_id: String) {
        if self.joined.contains_key(&share_id) {
            return;
        }

        if let Err(error) = self.service.snapshot(&share_id).await {
            tracing::debug!("[Channel] Session {} refused join of {}: {}", self.id, share_id, error);
            self.reply(ServerEvent::PollError(rejection(&share_id, &error)));
            return;
        }

        // Subscribe before reading the snapshot pushed to the joiner, so no
        // committed vote falls between the two.
        let receiver = self.service.rooms().subscribe(&share_id);
        self.next_generation += 1;
        let generation = self.next_generation;
        let forwarder = tokio::spawn(forward_room(
            receiver,
            self.outbound.clone(),
            share_id.clone(),
            generation,
        ));
        self.joined.insert(share_id.clone(), JoinedRoom { generation, forwarder });
        self.service.rooms().join(&share_id, self.id);

        // Hold the vote lane so no poll-updated for a later vote is queued
        // ahead of this snapshot.
        let lane = self.service.rooms().vote_lane(&share_id);
        let turn = lane.lock().await;
        match self.service.snapshot(&share_id).await {
            Ok(snapshot) => self.reply(ServerEvent::PollData(snapshot)),
            Err(error) => {
                tracing::warn!("[Channel] Snapshot of {} failed after join: {}", share_id, error);
            }
        }
        drop(turn);
        tracing::info!("[Channel] Session {} joined {}", self.id, share_id);
    }

    fn leave(&mut self, share_id: &str) {
        if let Some(room) = self.joined.remove(share_id) {
            room.forwarder.abort();
            self.service.rooms().leave(share_id, self.id);
            tracing::info!("[Channel] Session {} left {}", self.id, share_id);
        }
    }

    fn leave_all(&mut self) {
        let share_ids: Vec<String> = self.joined.keys().cloned().collect();
        for share_id in share_ids {
            self.leave(&share_id);
        }
    }

    async fn vote(&mut self, intent: VoteIntent) {
        let VoteIntent {
            share_id,
            option_index,
            voter_id,
        } = intent;

        match self.service.submit_vote(&share_id, option_index, &voter_id).await {
            Ok(outcome) => self.reply(ServerEvent::VoteSuccess(VoteAccepted {
                share_id,
                voted_option_index: outcome.voted_option_index,
            })),
            Err(error) => {
                tracing::debug!("[Channel] Session {} vote on {} refused: {}", self.id, share_id, error);
                self.reply(ServerEvent::VoteError(rejection(&share_id, &error)));
            }
        }
    }
}

fn rejection(share_id: &str, error: &BackendError) -> PollRejection {
    let client_error: PollError = error.to_client_error();
    if error.as_poll_error().is_none() {
        tracing::error!("[Channel] Request on {} failed: {}", share_id, error);
    }
    PollRejection::new(share_id, &client_error)
}

/// Copy a room's broadcasts into a session's outbound queue
///
/// A lagging receiver skips ahead; every `poll-updated` carries full
/// counts, so the next one brings the viewer back in sync.
async fn forward_room(
    mut receiver: broadcast::Receiver<ServerEvent>,
    outbound: mpsc::UnboundedSender<Outbound>,
    share_id: String,
    generation: u64,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                let item = Outbound {
                    room: Some((share_id.clone(), generation)),
                    event,
                };
                if outbound.send(item).is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("[Channel] Forwarder for {} lagged by {} events", share_id, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
