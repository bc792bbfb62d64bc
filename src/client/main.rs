/**
 * PollRoom Terminal Client
 *
 * ```text
 * pollroom-client create <question> <option> <option> [option...]
 * pollroom-client show <share-id>
 * pollroom-client vote <share-id> <option-number>
 * pollroom-client watch <share-id>
 * ```
 *
 * The server is taken from `POLLROOM_API_URL` (default
 * `http://127.0.0.1:5000`). Option numbers start at 1.
 */
use std::sync::Arc;
use std::time::Duration;

use pollroom::client::{
    ChannelConfig, ChannelEvent, ClientError, PollApiClient, PollChannel, PollSession, PollView,
    ViewAction, VoterStore,
};
use pollroom::shared::{AppConfig, PollError, ServerEvent};

const USAGE: &str = "usage:
  pollroom-client create <question> <option> <option> [option...]
  pollroom-client show <share-id>
  pollroom-client vote <share-id> <option-number>
  pollroom-client watch <share-id>";

/// How long `vote` waits for the server's answer
const VOTE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Vec<String>) -> Result<(), ClientError> {
    let config = AppConfig::from_env()?;
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    match (command.as_str(), rest) {
        ("create", [question, options @ ..]) => create(config, question, options).await,
        ("show", [share_id]) => show(config, share_id).await,
        ("vote", [share_id, option]) => {
            let option = parse_option(option)?;
            vote(config, share_id, option).await
        }
        ("watch", [share_id]) => watch(config, share_id).await,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn parse_option(raw: &str) -> Result<usize, ClientError> {
    raw.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| PollError::validation("option", format!("'{}' is not an option number", raw)).into())
}

async fn create(config: AppConfig, question: &str, options: &[String]) -> Result<(), ClientError> {
    let api = PollApiClient::new(config.clone());
    let poll = api.create_poll(question, options).await?;
    println!("Created poll {}", poll.share_id);
    println!("Share it with: pollroom-client watch {}", poll.share_id);
    println!("API: {}", config.api_url(&format!("/api/polls/{}", poll.share_id)));
    Ok(())
}

async fn show(config: AppConfig, share_id: &str) -> Result<(), ClientError> {
    let store = VoterStore::open_default(&config)?;
    let voter_id = store.voter_id()?;
    let api = PollApiClient::new(config);
    let response = api.get_poll(share_id, Some(&voter_id)).await?;

    let mut view = PollView::new(share_id);
    view.apply(ViewAction::SnapshotLoaded {
        response,
        local_vote: store.has_voted_on_poll(share_id),
    });
    print_view(&view);
    Ok(())
}

async fn open_session(config: AppConfig, share_id: &str) -> Result<PollSession, ClientError> {
    let store = Arc::new(VoterStore::open_default(&config)?);
    let (channel, events) = PollChannel::connect(ChannelConfig::new(config.ws_url()));
    let api = PollApiClient::new(config);
    PollSession::open(api, channel, events, store, share_id).await
}

async fn vote(config: AppConfig, share_id: &str, option: usize) -> Result<(), ClientError> {
    let mut session = open_session(config, share_id).await?;

    // Give the channel a moment to connect so the vote goes over it.
    let _ = tokio::time::timeout(Duration::from_secs(2), async {
        while !session.channel().is_connected() {
            match session.next_event().await {
                Some(Ok(_)) => {}
                _ => break,
            }
        }
    })
    .await;

    if session.view().has_voted() {
        println!("You already voted on this poll.");
        print_view(session.view());
        session.close().await;
        return Ok(());
    }

    session.select(option).await?;
    if session.view().selected_option() != Some(option) {
        let option_count = session.view().poll().map_or(0, |p| p.options.len());
        session.close().await;
        return Err(PollError::invalid_option(option as i64, option_count).into());
    }
    session.submit_vote().await?;

    let settled = tokio::time::timeout(VOTE_TIMEOUT, async {
        while session.view().pending_vote().is_some() {
            match session.next_event().await {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }
        Ok(())
    })
    .await;

    let outcome = match settled {
        Ok(result) => result,
        Err(_) => Err(PollError::transport("Timed out waiting for the vote to be confirmed").into()),
    };

    if outcome.is_ok() {
        if let Some(notice) = session.view().notice() {
            println!("{}", notice);
        }
        if let Some(error) = session.view().error() {
            println!("Vote failed: {}", error);
        }
        print_view(session.view());
    }
    session.close().await;
    outcome
}

async fn watch(config: AppConfig, share_id: &str) -> Result<(), ClientError> {
    let mut session = open_session(config, share_id).await?;
    print_view(session.view());

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(Ok(event)) => {
                    if describe(&event) {
                        print_view(session.view());
                    }
                }
                Some(Err(e)) => eprintln!("warning: {}", e),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.close().await;
    Ok(())
}

/// Print a line about an event; returns whether the counts should be redrawn
fn describe(event: &ChannelEvent) -> bool {
    match event {
        ChannelEvent::Connected => {
            println!("-- connected");
            false
        }
        ChannelEvent::Disconnected { reason } => {
            println!("-- disconnected ({}), reconnecting", reason);
            false
        }
        ChannelEvent::Server(ServerEvent::PollUpdated(_)) | ChannelEvent::Server(ServerEvent::PollData(_)) => true,
        ChannelEvent::Server(ServerEvent::ViewerCount(viewers)) => {
            println!("-- {} watching", viewers.count);
            false
        }
        ChannelEvent::Server(ServerEvent::PollError(rejection)) => {
            println!("-- {}", rejection.error());
            false
        }
        ChannelEvent::Server(_) => false,
    }
}

fn print_view(view: &PollView) {
    let Some(poll) = view.poll() else {
        println!("(poll not loaded)");
        return;
    };

    println!();
    println!("{}", poll.question);
    for (i, option) in poll.options.iter().enumerate() {
        let percent = if poll.total_votes == 0 {
            0.0
        } else {
            option.votes as f64 * 100.0 / poll.total_votes as f64
        };
        let marker = if view.voted_option_index() == Some(i as i64) { "*" } else { " " };
        println!("{} {:>2}. {:<30} {:>5} ({:>5.1}%)", marker, i + 1, option.text, option.votes, percent);
    }
    println!("   total votes: {}", poll.total_votes);
}
