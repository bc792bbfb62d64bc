//! Poll API integration tests
//!
//! Creation, lookup and the health probe through the full router

use axum::http::StatusCode;
use pollroom::shared::poll::GetPollResponse;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{assert_error_body, create_poll, test_server};

fn options(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Option {}", i)).collect()
}

#[tokio::test]
async fn test_create_poll_trims_input_and_starts_at_zero() {
    let server = test_server();

    let response = server
        .post("/api/polls")
        .json(&json!({
            "question": "  Favorite color?  ",
            "options": [" Red ", "", "   ", "Blue"]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let poll = &body["poll"];
    assert_eq!(poll["question"], "Favorite color?");
    assert_eq!(poll["options"], json!([{ "text": "Red", "votes": 0 }, { "text": "Blue", "votes": 0 }]));
    assert_eq!(poll["totalVotes"], 0);

    let share_id = poll["shareId"].as_str().unwrap();
    assert_eq!(share_id.len(), 10);
    assert!(share_id.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(poll["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_poll_option_count_bounds() {
    let server = test_server();

    for (count, expected) in [
        (1, StatusCode::BAD_REQUEST),
        (2, StatusCode::CREATED),
        (10, StatusCode::CREATED),
        (11, StatusCode::BAD_REQUEST),
    ] {
        let response = server
            .post("/api/polls")
            .json(&json!({ "question": "How many?", "options": options(count) }))
            .await;
        assert_eq!(response.status_code(), expected, "with {} options", count);

        if expected == StatusCode::BAD_REQUEST {
            let body: serde_json::Value = response.json();
            assert_error_body(&body, 400, "validation");
            assert_eq!(body["field"], "options");
        }
    }
}

#[tokio::test]
async fn test_create_poll_rejects_blank_and_oversized_question() {
    let server = test_server();

    let blank = server
        .post("/api/polls")
        .json(&json!({ "question": "   ", "options": ["a", "b"] }))
        .await;
    assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = blank.json();
    assert_error_body(&body, 400, "validation");
    assert_eq!(body["field"], "question");

    let long = server
        .post("/api/polls")
        .json(&json!({ "question": "q".repeat(501), "options": ["a", "b"] }))
        .await;
    assert_eq!(long.status_code(), StatusCode::BAD_REQUEST);

    let at_limit = server
        .post("/api/polls")
        .json(&json!({ "question": "q".repeat(500), "options": ["a", "b"] }))
        .await;
    assert_eq!(at_limit.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_created_polls_get_distinct_share_ids() {
    let server = test_server();
    let first = create_poll(&server, "Same question", &["a", "b"]).await;
    let second = create_poll(&server, "Same question", &["a", "b"]).await;
    assert_ne!(first.share_id, second.share_id);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_get_poll_returns_created_poll() {
    let server = test_server();
    let created = create_poll(&server, "Coffee or Tea?", &["Coffee", "Tea"]).await;

    let response = server.get(&format!("/api/polls/{}", created.share_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: GetPollResponse = response.json();
    assert_eq!(body.poll, created);
    assert!(!body.has_voted);
    assert_eq!(body.voted_option_index, None);
}

#[tokio::test]
async fn test_get_poll_is_idempotent() {
    let server = test_server();
    let created = create_poll(&server, "Coffee or Tea?", &["Coffee", "Tea"]).await;
    let path = format!("/api/polls/{}", created.share_id);

    let first: serde_json::Value = server.get(&path).await.json();
    let second: serde_json::Value = server.get(&path).await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_get_poll_reports_voter_state() {
    let server = test_server();
    let created = create_poll(&server, "Coffee or Tea?", &["Coffee", "Tea"]).await;
    let path = format!("/api/polls/{}", created.share_id);

    server
        .post(&format!("{}/vote", path))
        .json(&json!({ "optionIndex": 1, "voterId": "voter_a" }))
        .await
        .assert_status_ok();

    let voter: GetPollResponse = server.get(&path).add_query_param("voterId", "voter_a").await.json();
    assert!(voter.has_voted);
    assert_eq!(voter.voted_option_index, Some(1));

    let stranger: GetPollResponse = server.get(&path).add_query_param("voterId", "voter_b").await.json();
    assert!(!stranger.has_voted);
    assert_eq!(stranger.voted_option_index, None);

    // An empty voter id is the same as none.
    let empty: GetPollResponse = server.get(&path).add_query_param("voterId", "").await.json();
    assert!(!empty.has_voted);
}

#[tokio::test]
async fn test_get_unknown_poll_is_not_found() {
    let server = test_server();

    let response = server.get("/api/polls/zzzzzzzzzz").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json();
    assert_error_body(&body, 404, "not_found");
    assert_eq!(body["shareId"], "zzzzzzzzzz");
}

#[tokio::test]
async fn test_health() {
    let server = test_server();
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<serde_json::Value>(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_unknown_route_falls_back_to_404() {
    let server = test_server();
    let response = server.get("/api/nothing-here").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_error_body(&response.json(), 404, "validation");
}

#[tokio::test]
async fn test_missing_field_gets_json_error_body() {
    let server = test_server();
    let response = server.post("/api/polls").json(&json!({ "question": "Q" })).await;
    assert!(response.status_code().is_client_error());

    let body: serde_json::Value = response.json();
    assert_error_body(&body, response.status_code().as_u16(), "validation");
    assert_eq!(body["field"], "request");
    assert!(body["error"].as_str().unwrap().contains("options"));
}
