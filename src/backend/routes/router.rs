/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Routes
 *
 * 1. `GET /ws` - real-time poll rooms
 * 2. REST routes (`/api/polls...`, `/health`)
 * 3. Fallback (404 with a JSON error body)
 *
 * # Layers
 *
 * - `CorsLayer` - any origin, or only `CORS_ORIGIN` when it is set
 * - `TraceLayer` - request spans for `tracing`
 */
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::polls::handlers::not_found;
use crate::backend::realtime::handle_ws_upgrade;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Build the application router
pub fn create_router(app_state: AppState) -> Router<()> {
    let cors = cors_layer(app_state.config.cors_origin.as_deref());

    let router = Router::new().route("/ws", get(handle_ws_upgrade));
    let router = configure_api_routes(router);
    let router = router.fallback(not_found);

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("CORS_ORIGIN is not a valid header value, allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
