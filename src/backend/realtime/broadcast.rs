/**
 * Room Event Broadcasting
 *
 * Every poll room owns a `tokio::sync::broadcast` channel. All sessions
 * joined to the room hold a receiver and get a copy of each event, in
 * send order.
 *
 * Sending to a room nobody is listening to is not an error; the event is
 * simply dropped.
 */

use crate::shared::ServerEvent;
use tokio::sync::broadcast;

/// Sending half of a room's broadcast channel
pub type RoomBroadcast = broadcast::Sender<ServerEvent>;

/// Broadcast an event to every receiver of a room
///
/// # Returns
///
/// Number of receivers the event was handed to (0 if none)
pub fn broadcast_event(broadcast_tx: &RoomBroadcast, event: ServerEvent) -> usize {
    let name = event.name();
    match broadcast_tx.send(event) {
        Ok(receiver_count) => {
            tracing::debug!("[Rooms] {} sent to {} receivers", name, receiver_count);
            receiver_count
        }
        Err(_) => {
            tracing::debug!("[Rooms] No receivers for {}", name);
            0
        }
    }
}
