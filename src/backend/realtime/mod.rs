//! Real-time Poll Rooms
//!
//! This module provides the live side of the poll server: viewers join a
//! poll's room over a WebSocket and receive every committed vote as a
//! `poll-updated` event, plus `viewer-count` on every join and leave.
//!
//! # Architecture
//!
//! - **`broadcast`** - room broadcast channel type and send helper
//! - **`rooms`** - `RoomRegistry`: broadcast channel, members and vote lane per poll
//! - **`session`** - the `GET /ws` handler and per-connection session task
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── broadcast.rs - Room broadcast helper
//! ├── rooms.rs     - Room registry
//! └── session.rs   - WebSocket session
//! ```
//!
//! # Wire Format
//!
//! Every frame is a JSON text message `{"event": "<name>", "data": ...}`.
//! See `shared::event` for the full list.

/// Room broadcast helper
pub mod broadcast;

/// Room registry
pub mod rooms;

/// WebSocket session handler
pub mod session;

// Re-export commonly used types and functions
pub use broadcast::{broadcast_event, RoomBroadcast};
pub use rooms::{RoomRegistry, SessionId, VoteLane};
pub use session::handle_ws_upgrade;
