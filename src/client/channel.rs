/**
 * Real-time Poll Channel
 *
 * Client side of the `GET /ws` room protocol. A `PollChannel` is an owned
 * connection object: it is created with [`PollChannel::connect`], handed to
 * whoever needs it, and torn down with [`PollChannel::shutdown`]. There is
 * no process-wide socket.
 *
 * # Transport Loop
 *
 * A background task owns the WebSocket. It selects over commands from the
 * handle and frames from the server, and forwards decoded server events to
 * the event receiver returned by `connect`.
 *
 * When the connection drops the loop emits `Disconnected`, waits according
 * to the reconnect backoff, reconnects, rejoins every room that is still
 * joined, and emits `Connected` again. Reconnection never gives up; only
 * `shutdown` or dropping the handle ends the loop; either way the commands
 * queued before it are sent first.
 *
 * # Room Membership
 *
 * [`PollChannel::join`] returns a [`RoomMembership`] guard. Dropping the
 * guard sends `leave-poll`, so a room is left on every exit path of the
 * code that joined it.
 */
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::client::error::ClientError;
use crate::client::retry::{BackoffStrategy, ReconnectBackoff};
use crate::shared::{ClientEvent, PollError, ServerEvent, VoteIntent};

/// Default time `shutdown` waits for the transport loop to exit
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that happened on the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The socket is open and joined rooms have been rejoined
    Connected,
    /// The socket closed; a reconnect is scheduled
    Disconnected { reason: String },
    /// An event pushed by the server
    Server(ServerEvent),
}

/// Channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket URL, e.g. `ws://127.0.0.1:5000/ws`
    pub url: String,
    /// Delay schedule between reconnect attempts
    pub backoff: BackoffStrategy,
    /// How long `shutdown` waits before aborting the transport task
    pub shutdown_timeout: Duration,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff: BackoffStrategy::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

#[derive(Debug)]
enum Command {
    Send(ClientEvent),
    Shutdown,
}

/// Handle to a live poll channel
pub struct PollChannel {
    commands: mpsc::UnboundedSender<Command>,
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl std::fmt::Debug for PollChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollChannel")
            .field("connected", &self.is_connected())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl PollChannel {
    /// Start the transport loop and return the handle plus its event receiver
    ///
    /// The first connection attempt happens in the background; watch for
    /// [`ChannelEvent::Connected`].
    #[must_use = "the event receiver must be used to receive events"]
    pub fn connect(config: ChannelConfig) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(transport_loop(
            config.url,
            ReconnectBackoff::new(config.backoff),
            command_rx,
            event_tx,
            Arc::clone(&connected),
        ));

        let channel = Self {
            commands,
            connected,
            task: Some(task),
            shutdown_timeout: config.shutdown_timeout,
        };
        (channel, event_rx)
    }

    /// Whether the socket is currently open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn send(&self, event: ClientEvent) -> Result<(), ClientError> {
        self.commands
            .send(Command::Send(event))
            .map_err(|_| ClientError::ChannelClosed)
    }

    /// Join a poll's room
    ///
    /// The join is remembered and replayed after every reconnect until the
    /// returned guard is dropped or [`RoomMembership::leave`] is called.
    pub fn join(&self, share_id: impl Into<String>) -> Result<RoomMembership, ClientError> {
        let share_id = share_id.into();
        self.send(ClientEvent::JoinPoll(share_id.clone()))?;
        Ok(RoomMembership {
            share_id,
            commands: self.commands.clone(),
            left: false,
        })
    }

    /// Send a vote over the channel
    ///
    /// # Errors
    ///
    /// `PollError::Transport` when the socket is not open; callers fall back
    /// to the REST API in that case.
    pub fn vote(&self, intent: VoteIntent) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(PollError::transport("Real-time channel is not connected").into());
        }
        self.send(ClientEvent::Vote(intent))
    }

    /// Close the socket and stop reconnecting
    pub async fn shutdown(&mut self) {
        tracing::debug!("[Channel] Shutdown requested");
        let _ = self.commands.send(Command::Shutdown);

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("[Channel] Transport loop ended with join error: {}", e),
                Err(_) => {
                    tracing::warn!("[Channel] Transport loop did not exit in time, aborting");
                    task.abort();
                }
            }
        }
        self.connected.store(false, Ordering::Release);
    }
}

impl Drop for PollChannel {
    /// Detach the transport task after queueing a shutdown, so commands
    /// already queued (such as a membership's leave) are still written.
    fn drop(&mut self) {
        if self.task.take().is_some() {
            let _ = self.commands.send(Command::Shutdown);
        }
    }
}

/// Membership of one poll room; leaves the room when dropped
#[derive(Debug)]
pub struct RoomMembership {
    share_id: String,
    commands: mpsc::UnboundedSender<Command>,
    left: bool,
}

impl RoomMembership {
    pub fn share_id(&self) -> &str {
        &self.share_id
    }

    /// Leave the room now
    pub fn leave(mut self) {
        self.send_leave();
    }

    fn send_leave(&mut self) {
        if !self.left {
            self.left = true;
            let _ = self
                .commands
                .send(Command::Send(ClientEvent::LeavePoll(self.share_id.clone())));
        }
    }
}

impl Drop for RoomMembership {
    fn drop(&mut self) {
        self.send_leave();
    }
}

/// Why a connected session ended
enum SessionEnd {
    Shutdown,
    Lost(String),
}

async fn transport_loop(
    url: String,
    mut backoff: ReconnectBackoff,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    connected: Arc<AtomicBool>,
) {
    // Rooms to be joined on every (re)connect.
    let mut rooms: BTreeSet<String> = BTreeSet::new();

    loop {
        let reason = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                backoff.reset();
                tracing::info!("[Channel] Connected to {}", url);
                match run_connection(socket, &mut rooms, &mut commands, &events, &connected).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Lost(reason) => reason,
                }
            }
            Err(e) => format!("connect failed: {}", e),
        };

        connected.store(false, Ordering::Release);
        let delay = backoff.next_delay();
        tracing::warn!(
            "[Channel] Disconnected ({}), retrying in {:?} (attempt {})",
            reason,
            delay,
            backoff.attempt()
        );
        if events.send(ChannelEvent::Disconnected { reason }).is_err() {
            break;
        }

        if !wait_for_retry(delay, &mut rooms, &mut commands, &events).await {
            break;
        }
    }

    connected.store(false, Ordering::Release);
    tracing::debug!("[Channel] Transport loop exited");
}

type Socket = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn run_connection(
    socket: Socket,
    rooms: &mut BTreeSet<String>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
    connected: &AtomicBool,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    for share_id in rooms.iter() {
        if let Err(e) = send_event(&mut sink, &ClientEvent::JoinPoll(share_id.clone())).await {
            return SessionEnd::Lost(e);
        }
    }
    connected.store(true, Ordering::Release);
    if events.send(ChannelEvent::Connected).is_err() {
        let _ = sink.close().await;
        return SessionEnd::Shutdown;
    }

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(event)) => {
                    track_room(rooms, &event);
                    if let Err(e) = send_event(&mut sink, &event).await {
                        return SessionEnd::Lost(e);
                    }
                }
                Some(Command::Shutdown) | None => {
                    let _ = sink.close().await;
                    return SessionEnd::Shutdown;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => {
                        tracing::debug!("[Channel] Received {}", event.name());
                        if events.send(ChannelEvent::Server(event)).is_err() {
                            let _ = sink.close().await;
                            return SessionEnd::Shutdown;
                        }
                    }
                    Err(e) => tracing::warn!("[Channel] Unreadable server frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Lost("closed by server".to_string()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
            }
        }
    }
}

/// Sleep before the next connect while still honouring commands
///
/// Returns `false` if the channel was shut down meanwhile.
async fn wait_for_retry(
    delay: Duration,
    rooms: &mut BTreeSet<String>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            command = commands.recv() => match command {
                Some(Command::Send(ClientEvent::Vote(intent))) => {
                    // The vote never left this client.
                    let error = PollError::transport("Real-time channel is not connected");
                    let _ = events.send(ChannelEvent::Server(ServerEvent::vote_error(intent.share_id, &error)));
                }
                Some(Command::Send(event)) => track_room(rooms, &event),
                Some(Command::Shutdown) | None => return false,
            }
        }
    }
}

fn track_room(rooms: &mut BTreeSet<String>, event: &ClientEvent) {
    match event {
        ClientEvent::JoinPoll(share_id) => {
            rooms.insert(share_id.clone());
        }
        ClientEvent::LeavePoll(share_id) => {
            rooms.remove(share_id);
        }
        ClientEvent::Vote(_) => {}
    }
}

async fn send_event<S>(sink: &mut S, event: &ClientEvent) -> Result<(), String>
where
    S: futures_util::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(event).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}
