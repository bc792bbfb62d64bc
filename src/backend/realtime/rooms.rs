/**
 * Poll Rooms
 *
 * A room is the set of sessions currently viewing one poll. The registry
 * keeps, per share id:
 *
 * - the room's broadcast channel
 * - the ids of the sessions joined to it (the viewer count)
 * - the poll's vote lane
 *
 * # Vote Lane
 *
 * The lane is a `tokio::sync::Mutex<()>` that a vote holds from before
 * the repository call until after the resulting `poll-updated` has been
 * handed to the broadcast channel. Two votes on the same poll therefore
 * reach the channel in the order they were committed, and the channel
 * delivers them to every viewer in that order.
 *
 * # Presence
 *
 * Viewer counts are advisory. Every join and leave broadcasts the new
 * count while the registry lock is held, so the counts a viewer sees are
 * in membership order.
 */
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, Mutex as AsyncMutex};
use uuid::Uuid;

use crate::shared::ServerEvent;

use super::broadcast::{broadcast_event, RoomBroadcast};

/// Identifier of one WebSocket session
pub type SessionId = Uuid;

/// Per-poll serialization point for votes
pub type VoteLane = Arc<AsyncMutex<()>>;

/// Default capacity of a room's broadcast channel
pub const DEFAULT_ROOM_CAPACITY: usize = 256;

struct Room {
    sender: RoomBroadcast,
    members: HashSet<SessionId>,
    lane: VoteLane,
}

impl Room {
    fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
            members: HashSet::new(),
            lane: Arc::new(AsyncMutex::new(())),
        }
    }

    fn is_idle(&self) -> bool {
        self.members.is_empty()
            && self.sender.receiver_count() == 0
            && Arc::strong_count(&self.lane) == 1
    }
}

/// All live poll rooms
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<String, Room>>>,
    capacity: usize,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_CAPACITY)
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.room_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn with_rooms<T>(&self, f: impl FnOnce(&mut HashMap<String, Room>) -> T) -> T {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rooms)
    }

    /// Receiver for every event broadcast to the room from now on
    pub fn subscribe(&self, share_id: &str) -> broadcast::Receiver<ServerEvent> {
        let capacity = self.capacity;
        self.with_rooms(|rooms| {
            rooms
                .entry(share_id.to_string())
                .or_insert_with(|| Room::new(capacity))
                .sender
                .subscribe()
        })
    }

    /// Add a session to the room and broadcast the new viewer count
    ///
    /// Returns `None` if the session was already a member.
    pub fn join(&self, share_id: &str, session: SessionId) -> Option<usize> {
        let capacity = self.capacity;
        self.with_rooms(|rooms| {
            let room = rooms
                .entry(share_id.to_string())
                .or_insert_with(|| Room::new(capacity));
            if !room.members.insert(session) {
                return None;
            }
            let count = room.members.len();
            broadcast_event(&room.sender, ServerEvent::viewer_count(share_id, count));
            tracing::debug!("[Rooms] Session {} joined {} ({} viewers)", session, share_id, count);
            Some(count)
        })
    }

    /// Remove a session from the room and broadcast the new viewer count
    ///
    /// Returns `None` if the session was not a member.
    pub fn leave(&self, share_id: &str, session: SessionId) -> Option<usize> {
        self.with_rooms(|rooms| {
            let room = rooms.get_mut(share_id)?;
            if !room.members.remove(&session) {
                return None;
            }
            let count = room.members.len();
            broadcast_event(&room.sender, ServerEvent::viewer_count(share_id, count));
            tracing::debug!("[Rooms] Session {} left {} ({} viewers)", session, share_id, count);
            Some(count)
        })
    }

    /// Number of sessions joined to the room
    pub fn viewer_count(&self, share_id: &str) -> usize {
        self.with_rooms(|rooms| rooms.get(share_id).map_or(0, |room| room.members.len()))
    }

    /// Whether the session is joined to the room
    pub fn is_member(&self, share_id: &str, session: SessionId) -> bool {
        self.with_rooms(|rooms| {
            rooms
                .get(share_id)
                .is_some_and(|room| room.members.contains(&session))
        })
    }

    /// Broadcast an event to the room, if it exists
    pub fn broadcast(&self, share_id: &str, event: ServerEvent) -> usize {
        self.with_rooms(|rooms| match rooms.get(share_id) {
            Some(room) => broadcast_event(&room.sender, event),
            None => 0,
        })
    }

    /// The poll's vote lane, creating the room if needed
    pub fn vote_lane(&self, share_id: &str) -> VoteLane {
        let capacity = self.capacity;
        self.with_rooms(|rooms| {
            rooms
                .entry(share_id.to_string())
                .or_insert_with(|| Room::new(capacity))
                .lane
                .clone()
        })
    }

    /// Number of rooms currently tracked
    pub fn room_count(&self) -> usize {
        self.with_rooms(|rooms| rooms.len())
    }

    /// Drop rooms with no members, no receivers and no vote in flight
    ///
    /// Returns the number of rooms removed.
    pub fn cleanup_inactive_rooms(&self) -> usize {
        self.with_rooms(|rooms| {
            let before = rooms.len();
            rooms.retain(|_, room| !room.is_idle());
            before - rooms.len()
        })
    }
}
