/**
 * Error Conversion
 *
 * This module converts backend errors into HTTP responses.
 *
 * # Response Format
 *
 * Error responses are JSON built from the shared `ErrorBody` plus the
 * status code:
 * ```json
 * {
 *   "error": "Already voted for option 0",
 *   "kind": "duplicate_vote",
 *   "votedOptionIndex": 0,
 *   "status": 409
 * }
 * ```
 */

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;
use crate::shared::ErrorBody;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Http] Request failed: {}", self);
        } else {
            tracing::debug!("[Http] Request rejected: {}", self);
        }

        let body = ErrorBody::from(&self.to_client_error());
        let mut json = match serde_json::to_value(&body) {
            Ok(json) => json,
            Err(_) => serde_json::json!({ "error": body.error, "kind": body.kind }),
        };
        if let Some(object) = json.as_object_mut() {
            object.insert("status".to_string(), status.as_u16().into());
        }

        (status, Json(json)).into_response()
    }
}

impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        Self::handler(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for BackendError {
    fn from(rejection: QueryRejection) -> Self {
        Self::handler(rejection.status(), rejection.body_text())
    }
}
