/**
 * Poll REST Handlers
 *
 * - `POST /api/polls` - create a poll
 * - `GET /api/polls/{share_id}?voterId=` - fetch a poll and the caller's vote
 * - `POST /api/polls/{share_id}/vote` - cast a vote (fallback path when the
 *   real-time channel is unavailable)
 * - `GET /health` - liveness probe
 *
 * Errors are returned as `BackendError` and rendered by its
 * `IntoResponse` implementation. Body and query extraction failures are
 * taken as `Result`s so they get the same JSON error body.
 */
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{StatusCode, Uri},
    Json,
};

use crate::backend::error::BackendError;
use crate::shared::poll::{
    CreatePollRequest, CreatePollResponse, GetPollQuery, GetPollResponse, VoteRequest, VoteResponse,
};

use super::service::PollService;

/// Handle `POST /api/polls`
pub async fn create_poll(
    State(service): State<PollService>,
    payload: Result<Json<CreatePollRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePollResponse>), BackendError> {
    let Json(request) = payload?;
    let poll = service.create_poll(&request.question, &request.options).await?;
    Ok((StatusCode::CREATED, Json(CreatePollResponse { poll })))
}

/// Handle `GET /api/polls/{share_id}`
pub async fn get_poll(
    State(service): State<PollService>,
    Path(share_id): Path<String>,
    query: Result<Query<GetPollQuery>, QueryRejection>,
) -> Result<Json<GetPollResponse>, BackendError> {
    let Query(query) = query?;
    let voter_id = query.voter_id.as_deref().filter(|v| !v.is_empty());
    let response = service.get_poll(&share_id, voter_id).await?;
    Ok(Json(response))
}

/// Handle `POST /api/polls/{share_id}/vote`
pub async fn vote(
    State(service): State<PollService>,
    Path(share_id): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, BackendError> {
    let Json(request) = payload?;
    let outcome = service
        .submit_vote(&share_id, request.option_index, &request.voter_id)
        .await?;
    Ok(Json(VoteResponse {
        poll: outcome.poll,
        voted_option_index: outcome.voted_option_index,
    }))
}

/// Handle `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> BackendError {
    BackendError::handler(StatusCode::NOT_FOUND, format!("No route for {}", uri.path()))
}
