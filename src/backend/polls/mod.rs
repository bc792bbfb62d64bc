//! Poll Module
//!
//! Poll storage and the REST surface.
//!
//! - **`repository`** - `PollRepository`, the storage entry point
//! - **`memory`** - in-memory store with one lock per poll
//! - **`postgres`** - PostgreSQL store with row locking
//! - **`service`** - vote submission through the poll's vote lane
//! - **`handlers`** - axum handlers for `/api/polls`

pub mod handlers;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod service;

pub use repository::{PollRepository, VoteOutcome};
pub use service::PollService;
