//! Poll repository and full router on PostgreSQL

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum_test::TestServer;
use pollroom::backend::polls::PollRepository;
use pollroom::backend::routes::router::create_router;
use pollroom::backend::server::config::load_database;
use pollroom::backend::server::{AppState, ServerConfig};
use pollroom::shared::PollError;
use serde_json::json;
use serial_test::serial;

use crate::assert_counts;
use crate::common::opts;

async fn repository() -> PollRepository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for e2e tests");
    let pool = load_database(Some(url.as_str()))
        .await
        .expect("Failed to connect and migrate test database");
    PollRepository::postgres(pool)
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
#[serial]
async fn test_postgres_create_vote_and_reload() {
    let repo = repository().await;
    assert_eq!(repo.backend_name(), "postgres");

    let poll = repo
        .create_poll("  Coffee or Tea?  ", &opts(&["Coffee", " ", "Tea"]))
        .await
        .unwrap();
    assert_eq!(poll.question, "Coffee or Tea?");
    assert_counts!(poll, [0, 0]);

    let outcome = repo.cast_vote(&poll.share_id, 1, "voter_pg").await.unwrap();
    assert_eq!(outcome.voted_option_index, 1);
    assert_counts!(outcome.poll, [0, 1]);

    let err = repo.cast_vote(&poll.share_id, 0, "voter_pg").await.unwrap_err();
    assert_matches!(err.as_poll_error(), Some(PollError::DuplicateVote { voted_option_index: 1 }));

    let err = repo.cast_vote(&poll.share_id, 7, "voter_other").await.unwrap_err();
    assert_matches!(err.as_poll_error(), Some(PollError::InvalidOption { option_count: 2, .. }));

    let reloaded = repo.get_poll(&poll.share_id, Some("voter_pg")).await.unwrap();
    assert!(reloaded.has_voted);
    assert_eq!(reloaded.voted_option_index, Some(1));
    assert_counts!(reloaded.poll, [0, 1]);

    let err = repo.get_poll("zzzzzzzzzz", None).await.unwrap_err();
    assert_matches!(err.as_poll_error(), Some(PollError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires PostgreSQL
#[serial]
async fn test_postgres_concurrent_votes() {
    let state = AppState::new(repository().await, ServerConfig::default());
    let poll = state
        .polls
        .create_poll("Pick", &opts(&["a", "b"]))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..40 {
        let service = state.polls.clone();
        let share_id = poll.share_id.clone();
        tasks.push(tokio::spawn(async move {
            // Every voter tries twice; only the first counts.
            let first = service.submit_vote(&share_id, i % 2, &format!("voter_{}", i)).await;
            let second = service.submit_vote(&share_id, (i + 1) % 2, &format!("voter_{}", i)).await;
            (first.is_ok(), second.is_ok())
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), (true, false));
    }

    let snapshot = state.polls.snapshot(&poll.share_id).await.unwrap();
    assert_counts!(snapshot, [20, 20]);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
#[serial]
async fn test_postgres_router() {
    let state = AppState::new(repository().await, ServerConfig::default());
    let server = TestServer::new(create_router(state)).unwrap();

    let created = server
        .post("/api/polls")
        .json(&json!({ "question": "Coffee or Tea?", "options": ["Coffee", "Tea"] }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let share_id = created.json::<serde_json::Value>()["poll"]["shareId"]
        .as_str()
        .unwrap()
        .to_string();

    let vote = server
        .post(&format!("/api/polls/{}/vote", share_id))
        .json(&json!({ "optionIndex": 0, "voterId": "voter_router" }))
        .await;
    assert_eq!(vote.status_code(), StatusCode::OK);

    let again = server
        .post(&format!("/api/polls/{}/vote", share_id))
        .json(&json!({ "optionIndex": 0, "voterId": "voter_router" }))
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);
}
