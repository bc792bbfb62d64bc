// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! PollRoom - Main Library
//!
//! PollRoom is a real-time poll service: a poll is created with a question
//! and 2-10 options, shared by a short id, and every viewer of that poll sees
//! the vote counts change live as votes are cast.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and client
//!   - Poll documents, REST bodies, channel events
//!   - Validation rules and error types
//!   - Client configuration
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server and WebSocket room channel
//!   - Poll repository (in-memory or PostgreSQL)
//!   - Room registry, viewer counts and ordered vote broadcasts
//!
//! - **`client`** - Client library
//!   - REST client and reconnecting room channel
//!   - Voter identity and local vote records
//!   - Poll view reducer with optimistic votes
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enables the `backend` module)
//!   - Includes Axum, tower-http, sqlx and dotenv
//!
//! # Usage
//!
//! ## Server-Side
//!
//! ```rust,no_run
//! use pollroom::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() {
//! let app = create_app(ServerConfig::default()).await;
//! // Serve with axum::serve
//! # }
//! ```
//!
//! ## Client-Side
//!
//! ```rust,no_run
//! use pollroom::client::PollApiClient;
//! use pollroom::shared::AppConfig;
//!
//! # async fn example() -> Result<(), pollroom::shared::PollError> {
//! let api = PollApiClient::new(AppConfig::default());
//! let poll = api
//!     .create_poll("Coffee or tea?", &["Coffee".to_string(), "Tea".to_string()])
//!     .await?;
//! println!("share id: {}", poll.share_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Consistency
//!
//! - Votes on one poll are serialized; every viewer sees the same order of
//!   count updates.
//! - Counts only grow. A voter gets at most one vote per poll.
//! - A viewer that reconnects reloads a full snapshot, so missed updates
//!   never leave it behind.
//!
//! # Error Handling
//!
//! - `shared::PollError` is the error every caller sees
//! - `backend::error::BackendError` wraps it with database failures
//! - `client::ClientError` wraps it with config and local I/O failures

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Client library
pub mod client;
