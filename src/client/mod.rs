//! Poll Client
//!
//! Client library for PollRoom servers. Compiled without the `ssr` feature.
//!
//! # Architecture
//!
//! - **`api`** - REST client (`reqwest`)
//! - **`channel`** - owned real-time channel with reconnect (`tokio-tungstenite`)
//! - **`retry`** - reconnect backoff
//! - **`reconcile`** - `PollView` reducer: optimistic votes and server reconciliation
//! - **`identity`** - voter id and local vote records on disk
//! - **`session`** - one poll page wiring all of the above together
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pollroom::client::{ChannelConfig, PollApiClient, PollChannel, PollSession, VoterStore};
//! use pollroom::shared::AppConfig;
//!
//! # async fn example() -> Result<(), pollroom::client::ClientError> {
//! let config = AppConfig::from_env()?;
//! let store = Arc::new(VoterStore::open_default(&config)?);
//! let (channel, events) = PollChannel::connect(ChannelConfig::new(config.ws_url()));
//! let api = PollApiClient::new(config);
//!
//! let mut session = PollSession::open(api, channel, events, store, "aB3dE5fG7h").await?;
//! session.select(0).await?;
//! session.submit_vote().await?;
//! while let Some(event) = session.next_event().await {
//!     let _ = event?;
//!     if session.view().has_voted() {
//!         break;
//!     }
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```

/// REST client
pub mod api;

/// Real-time channel
pub mod channel;

/// Client error types
pub mod error;

/// Voter identity store
pub mod identity;

/// View reducer
pub mod reconcile;

/// Reconnect backoff
pub mod retry;

/// Poll page session
pub mod session;

pub use api::PollApiClient;
pub use channel::{ChannelConfig, ChannelEvent, PollChannel, RoomMembership};
pub use error::ClientError;
pub use identity::{LocalVote, VoterStore};
pub use reconcile::{ConnectionState, Effect, PollView, ViewAction};
pub use retry::{BackoffStrategy, ReconnectBackoff};
pub use session::PollSession;
