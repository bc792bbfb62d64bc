/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container, holding:
 * - the `PollService` (repository plus room registry)
 * - the loaded `ServerConfig`
 *
 * Everything inside is cheap to clone and safe to share across tasks.
 *
 * # Example
 *
 * ```rust
 * use axum::extract::State;
 * use pollroom::backend::polls::PollService;
 *
 * async fn handler(State(service): State<PollService>) {
 *     let _rooms = service.rooms().room_count();
 * }
 * ```
 */
use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::polls::{PollRepository, PollService};
use crate::backend::realtime::RoomRegistry;
use crate::backend::server::config::ServerConfig;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub polls: PollService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(repository: PollRepository, config: ServerConfig) -> Self {
        let rooms = RoomRegistry::new(config.room_capacity);
        Self {
            polls: PollService::new(repository, rooms),
            config: Arc::new(config),
        }
    }

    /// State with an empty in-memory repository and default settings
    pub fn in_memory() -> Self {
        Self::new(PollRepository::in_memory(), ServerConfig::default())
    }
}

impl FromRef<AppState> for PollService {
    fn from_ref(state: &AppState) -> Self {
        state.polls.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
