//! REST client tests against a mock server

use assert_matches::assert_matches;
use pollroom::client::PollApiClient;
use pollroom::shared::{AppConfig, PollError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn poll_json(share_id: &str, votes: [u64; 2]) -> serde_json::Value {
    json!({
        "id": "5f0c6a3e-8a53-4c52-9d4b-0f6a2f1e7b10",
        "shareId": share_id,
        "question": "Coffee or Tea?",
        "options": [
            { "text": "Coffee", "votes": votes[0] },
            { "text": "Tea", "votes": votes[1] }
        ],
        "totalVotes": votes[0] + votes[1],
        "createdAt": "2025-01-01T12:00:00Z"
    })
}

fn client_for(server: &MockServer) -> PollApiClient {
    let config = AppConfig::builder()
        .server_url(server.uri())
        .build()
        .expect("mock server uri is a valid url");
    PollApiClient::new(config)
}

#[tokio::test]
async fn test_create_poll_sends_trimmed_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/polls"))
        .and(body_json(json!({ "question": "Coffee or Tea?", "options": ["Coffee", "Tea"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "poll": poll_json("aB3dE5fG7h", [0, 0]) })))
        .expect(1)
        .mount(&server)
        .await;

    let poll = client_for(&server)
        .create_poll(" Coffee or Tea? ", &[" Coffee".to_string(), String::new(), "Tea ".to_string()])
        .await
        .unwrap();
    assert_eq!(poll.share_id, "aB3dE5fG7h");
    assert_eq!(poll.total_votes, 0);
}

#[tokio::test]
async fn test_get_poll_passes_voter_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/polls/aB3dE5fG7h"))
        .and(query_param("voterId", "voter_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "poll": poll_json("aB3dE5fG7h", [2, 1]),
            "hasVoted": true,
            "votedOptionIndex": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .get_poll("aB3dE5fG7h", Some("voter_1"))
        .await
        .unwrap();
    assert!(response.has_voted);
    assert_eq!(response.voted_option_index, Some(1));
    assert_eq!(response.poll.total_votes, 3);
}

#[tokio::test]
async fn test_not_found_body_becomes_not_found_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/polls/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Poll not found: missing",
            "kind": "not_found",
            "shareId": "missing",
            "status": 404
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).get_poll("missing", None).await.unwrap_err();
    assert_eq!(err, PollError::not_found("missing"));
}

#[tokio::test]
async fn test_duplicate_vote_body_keeps_voted_option() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/polls/aB3dE5fG7h/vote"))
        .and(body_json(json!({ "optionIndex": 1, "voterId": "voter_1" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "Already voted for option 0",
            "kind": "duplicate_vote",
            "votedOptionIndex": 0,
            "status": 409
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .vote("aB3dE5fG7h", 1, "voter_1")
        .await
        .unwrap_err();
    assert_eq!(err.voted_option_index(), Some(0));
    assert_matches!(err, PollError::DuplicateVote { voted_option_index: 0 });
}

#[tokio::test]
async fn test_vote_success_decodes_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/polls/aB3dE5fG7h/vote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "poll": poll_json("aB3dE5fG7h", [1, 0]),
            "votedOptionIndex": 0
        })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .vote("aB3dE5fG7h", 0, "voter_1")
        .await
        .unwrap();
    assert_eq!(response.voted_option_index, 0);
    assert_eq!(response.poll.options[0].votes, 1);
}

#[tokio::test]
async fn test_non_json_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).health().await.unwrap_err();
    assert_matches!(err, PollError::Transport { .. });
}

#[tokio::test]
async fn test_unreadable_success_body_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/polls/aB3dE5fG7h"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"poll\": 42}"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_poll("aB3dE5fG7h", None).await.unwrap_err();
    assert_matches!(err, PollError::Serialization { .. });
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = AppConfig::builder()
        .server_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let err = PollApiClient::new(config).health().await.unwrap_err();
    assert_matches!(err, PollError::Transport { .. });
}
