/**
 * Server Initialization
 *
 * This module builds the Axum application: it picks the poll repository,
 * creates the application state, assembles the router and starts the
 * idle room sweep.
 *
 * # Initialization Process
 *
 * 1. Connect to PostgreSQL if `DATABASE_URL` is set (falling back to the
 *    in-memory store otherwise)
 * 2. Create the room registry and poll service
 * 3. Create and configure the router
 * 4. Spawn the periodic room cleanup task
 */
use axum::Router;

use crate::backend::polls::PollRepository;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Build the application for the given configuration
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing poll server");

    let repository = match load_database(config.database_url.as_deref()).await {
        Some(pool) => PollRepository::postgres(pool),
        None => PollRepository::in_memory(),
    };
    tracing::info!("[Polls] Using {} poll store", repository.backend_name());

    let app_state = AppState::new(repository, config);
    spawn_room_cleanup(&app_state);

    let app = create_router(app_state);
    tracing::info!("Router configured with periodic cleanup task");
    app
}

/// Periodically drop rooms nobody is using
pub fn spawn_room_cleanup(app_state: &AppState) -> tokio::task::JoinHandle<()> {
    let rooms = app_state.polls.rooms().clone();
    let period = app_state.config.cleanup_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = rooms.cleanup_inactive_rooms();
            tracing::debug!("[Rooms] Cleaned up {} inactive rooms", removed);
        }
    })
}
