//! `PollChannel` against a real server on a TCP port

use std::time::Duration;

use pollroom::backend::routes::router::create_router;
use pollroom::backend::server::AppState;
use pollroom::client::{BackoffStrategy, ChannelConfig, ChannelEvent, PollChannel};
use pollroom::shared::{ServerEvent, VoteIntent};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::common::{opts, spawn_server, EVENT_TIMEOUT};

fn fast_retry(url: String) -> ChannelConfig {
    ChannelConfig::new(url).with_backoff(BackoffStrategy::Fixed {
        interval: Duration::from_millis(50),
    })
}

async fn next_channel_event(events: &mut UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("Timed out waiting for a channel event")
        .expect("Channel event stream ended")
}

async fn wait_for<T>(
    events: &mut UnboundedReceiver<ChannelEvent>,
    mut pick: impl FnMut(ChannelEvent) -> Option<T>,
) -> T {
    loop {
        if let Some(found) = pick(next_channel_event(events).await) {
            return found;
        }
    }
}

#[tokio::test]
async fn test_channel_joins_and_receives_updates() {
    let server = spawn_server().await;
    let poll = server
        .state
        .polls
        .create_poll("Coffee or Tea?", &opts(&["Coffee", "Tea"]))
        .await
        .unwrap();

    let (mut channel, mut events) = PollChannel::connect(fast_retry(format!("ws://{}/ws", server.addr)));
    let membership = channel.join(poll.share_id.clone()).unwrap();
    assert_eq!(membership.share_id(), poll.share_id);

    let snapshot = wait_for(&mut events, |e| match e {
        ChannelEvent::Server(ServerEvent::PollData(s)) => Some(s),
        _ => None,
    })
    .await;
    assert_eq!(snapshot.total_votes, 0);
    assert!(channel.is_connected());

    channel
        .vote(VoteIntent {
            share_id: poll.share_id.clone(),
            option_index: 1,
            voter_id: "voter_channel".to_string(),
        })
        .unwrap();

    let update = wait_for(&mut events, |e| match e {
        ChannelEvent::Server(ServerEvent::PollUpdated(s)) => Some(s),
        _ => None,
    })
    .await;
    assert_eq!(update.options[1].votes, 1);

    drop(membership);
    channel.shutdown().await;
    assert!(!channel.is_connected());
}

#[tokio::test]
async fn test_dropping_membership_leaves_room() {
    let server = spawn_server().await;
    let poll = server
        .state
        .polls
        .create_poll("Coffee or Tea?", &opts(&["Coffee", "Tea"]))
        .await
        .unwrap();
    let url = format!("ws://{}/ws", server.addr);

    let (mut watcher, mut watcher_events) = PollChannel::connect(fast_retry(url.clone()));
    let _watching = watcher.join(poll.share_id.clone()).unwrap();
    let count = wait_for(&mut watcher_events, |e| match e {
        ChannelEvent::Server(ServerEvent::ViewerCount(v)) => Some(v.count),
        _ => None,
    })
    .await;
    assert_eq!(count, 1);

    let (mut visitor, _visitor_events) = PollChannel::connect(fast_retry(url));
    let visiting = visitor.join(poll.share_id.clone()).unwrap();
    let count = wait_for(&mut watcher_events, |e| match e {
        ChannelEvent::Server(ServerEvent::ViewerCount(v)) => Some(v.count),
        _ => None,
    })
    .await;
    assert_eq!(count, 2);

    drop(visiting);
    let count = wait_for(&mut watcher_events, |e| match e {
        ChannelEvent::Server(ServerEvent::ViewerCount(v)) => Some(v.count),
        _ => None,
    })
    .await;
    assert_eq!(count, 1);

    visitor.shutdown().await;
    watcher.shutdown().await;
}

#[tokio::test]
async fn test_channel_rejoins_after_server_comes_up() {
    // Reserve a port, then release it so the first attempts fail.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let state = AppState::in_memory();
    let poll = state
        .polls
        .create_poll("Coffee or Tea?", &opts(&["Coffee", "Tea"]))
        .await
        .unwrap();

    let (mut channel, mut events) = PollChannel::connect(fast_retry(format!("ws://{}/ws", addr)));
    let _membership = channel.join(poll.share_id.clone()).unwrap();

    let reason = wait_for(&mut events, |e| match e {
        ChannelEvent::Disconnected { reason } => Some(reason),
        _ => None,
    })
    .await;
    assert!(reason.contains("connect failed"), "unexpected reason: {}", reason);
    assert!(!channel.is_connected());

    // A vote while disconnected is answered locally with a transport error.
    channel
        .vote(VoteIntent {
            share_id: poll.share_id.clone(),
            option_index: 0,
            voter_id: "voter_offline".to_string(),
        })
        .unwrap_err();

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let app = create_router(state.clone());
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    wait_for(&mut events, |e| matches!(e, ChannelEvent::Connected).then_some(())).await;
    let snapshot = wait_for(&mut events, |e| match e {
        ChannelEvent::Server(ServerEvent::PollData(s)) => Some(s),
        _ => None,
    })
    .await;
    assert_eq!(snapshot.share_id, poll.share_id);
    assert_eq!(state.polls.rooms().viewer_count(&poll.share_id), 1);

    channel.shutdown().await;
    server.abort();
}
