//! Backend Module
//!
//! This module contains all server-side code for PollRoom. It provides an
//! Axum HTTP server with a REST API for polls and a WebSocket endpoint for
//! live poll rooms.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`polls`** - Poll repository (memory or PostgreSQL), vote service, REST handlers
//! - **`realtime`** - Poll rooms, presence and the WebSocket session
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs     - Module exports and documentation
//! ├── main.rs    - `pollroom-server` binary
//! ├── server/    - Server initialization and state
//! ├── routes/    - Route configuration
//! ├── polls/     - Storage, vote service and handlers
//! ├── realtime/  - Rooms and WebSocket sessions
//! └── error/     - Error types
//! ```
//!
//! # Consistency
//!
//! Votes are serialized per poll twice over: the repository makes the
//! duplicate check and the counter increments one atomic step, and the
//! room's vote lane keeps `poll-updated` broadcasts in commit order. Votes
//! on different polls never wait on each other.

/// Server initialization and state
pub mod server;

/// Route configuration
pub mod routes;

/// Poll storage and REST handlers
pub mod polls;

/// Poll rooms and WebSocket sessions
pub mod realtime;

/// Backend error types
pub mod error;
