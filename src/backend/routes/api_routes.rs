/**
 * API Route Configuration
 *
 * # Routes
 *
 * ## Polls
 * - `POST /api/polls` - Create a poll
 * - `GET /api/polls/{share_id}` - Fetch a poll (`?voterId=` to include the caller's vote)
 * - `POST /api/polls/{share_id}/vote` - Cast a vote
 *
 * ## Health
 * - `GET /health` - Liveness probe
 */

use axum::routing::{get, post};
use axum::Router;

use crate::backend::polls::handlers::{create_poll, get_poll, health, vote};
use crate::backend::server::state::AppState;

/// Add the REST routes to a router
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/polls", post(create_poll))
        .route("/api/polls/{share_id}", get(get_poll))
        .route("/api/polls/{share_id}/vote", post(vote))
        .route("/health", get(health))
}
