//! Socket manager
//!
//! [`SocketManager`] is a handle to a single driver task. The driver owns the
//! transport, the pending handshake, the reconnect deadline and the session
//! state, and feeds every network callback through the state machine.

use super::config::SocketConfig;
use super::error::SocketError;
use super::machine::{self, Effect, ReconnectPolicy, SocketEvent, Transition};
use super::state::{ReadyState, SessionState, SocketSnapshot, TransportError};
use crate::protocol::{CloseCode, CloseInfo, IncomingMessage, RawFrame};
use futures::future::BoxFuture;
use futures::FutureExt;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn, Instrument};
use uuid::Uuid;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ConnectFuture = BoxFuture<'static, Result<WsStream, tungstenite::Error>>;

/// Lifecycle logging, raised to info when the manager runs in debug mode
macro_rules! lifecycle {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

enum Command {
    Connect,
    Send(String),
    Shutdown,
}

/// Handle to a resilient WebSocket connection
///
/// Dropping the handle tears the connection down, the same as
/// [`SocketManager::shutdown`] without waiting for it.
pub struct SocketManager {
    session_id: Uuid,
    config: SocketConfig,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<SocketSnapshot>,
    messages: broadcast::Sender<IncomingMessage>,
    task: JoinHandle<()>,
}

impl SocketManager {
    /// Validate the config, spawn the driver and begin connecting
    pub fn start(config: SocketConfig) -> Result<Self, SocketError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SocketError::NoRuntime)?;

        let session_id = Uuid::new_v4();
        let state = SessionState::new();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot(session_id));
        let (messages_tx, _) = broadcast::channel(config.message_buffer);

        let driver = Driver {
            session_id,
            policy: config.policy(),
            config: config.clone(),
            state,
            commands: commands_rx,
            commands_open: true,
            snapshot: snapshot_tx,
            messages: messages_tx.clone(),
            connecting: None,
            stream: None,
            peer_close: None,
            reconnect_at: None,
            inbox: VecDeque::new(),
        };

        let span = tracing::info_span!("socket", session_id = %session_id, url = %config.url);
        let task = runtime.spawn(driver.run().instrument(span));

        Ok(Self {
            session_id,
            config,
            commands: commands_tx,
            snapshot: snapshot_rx,
            messages: messages_tx,
            task,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    pub fn ready_state(&self) -> ReadyState {
        self.snapshot.borrow().ready_state
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.snapshot.borrow().reconnect_attempts
    }

    /// Most recently received message
    pub fn last_message(&self) -> Option<IncomingMessage> {
        self.snapshot.borrow().last_message.clone()
    }

    /// Most recent transport error
    pub fn error(&self) -> Option<TransportError> {
        self.snapshot.borrow().last_error.clone()
    }

    pub fn snapshot(&self) -> SocketSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn watch(&self) -> watch::Receiver<SocketSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to decoded messages
    pub fn messages(&self) -> broadcast::Receiver<IncomingMessage> {
        self.messages.subscribe()
    }

    /// Wait until the session satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SocketSnapshot) -> bool,
    ) -> Result<SocketSnapshot, SocketError> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| SocketError::ManagerClosed)?;
        Ok((*snapshot).clone())
    }

    /// Serialize `payload` as JSON text and send it
    ///
    /// Returns `Ok(false)` when the connection is not open; the payload is
    /// dropped, not queued.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<bool, SocketError> {
        let text = serde_json::to_string(payload)?;
        Ok(self.send_text(text))
    }

    /// Send raw text; `false` when the connection is not open
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        let ready_state = self.ready_state();
        if ready_state != ReadyState::Open {
            debug!(
                session_id = %self.session_id,
                ready_state = %ready_state,
                "Socket not open, dropping outgoing message"
            );
            return false;
        }
        self.commands.send(Command::Send(text.into())).is_ok()
    }

    /// Connect again after the session closed
    ///
    /// Resets the reconnect budget. Ignored while a transport is active.
    pub fn connect(&self) -> Result<(), SocketError> {
        self.commands
            .send(Command::Connect)
            .map_err(|_| SocketError::ManagerClosed)
    }

    /// Cancel any pending reconnect, close the transport and wait for the
    /// driver to finish
    pub async fn shutdown(self) {
        let Self {
            session_id,
            commands,
            task,
            ..
        } = self;

        if commands.send(Command::Shutdown).is_err() {
            debug!(session_id = %session_id, "Socket driver already stopped");
        }
        drop(commands);

        if let Err(e) = task.await {
            warn!(session_id = %session_id, error = %e, "Socket driver task failed");
        }
    }
}

impl std::fmt::Debug for SocketManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketManager")
            .field("session_id", &self.session_id)
            .field("url", &self.config.url)
            .field("ready_state", &self.ready_state())
            .finish_non_exhaustive()
    }
}

enum Wake {
    Command(Option<Command>),
    Connected(Result<WsStream, tungstenite::Error>),
    Frame(Option<Result<Message, tungstenite::Error>>),
    ReconnectDue,
}

struct Driver {
    session_id: Uuid,
    config: SocketConfig,
    policy: ReconnectPolicy,
    state: SessionState,
    commands: mpsc::UnboundedReceiver<Command>,
    commands_open: bool,
    snapshot: watch::Sender<SocketSnapshot>,
    messages: broadcast::Sender<IncomingMessage>,
    connecting: Option<ConnectFuture>,
    stream: Option<WsStream>,
    /// Close frame received from the peer, reported once the stream ends
    peer_close: Option<CloseInfo>,
    reconnect_at: Option<Instant>,
    inbox: VecDeque<SocketEvent>,
}

impl Driver {
    async fn run(mut self) {
        lifecycle!(self.config.debug, "Socket driver started");
        self.dispatch(SocketEvent::Connect).await;

        while !self.finished() {
            let wake = tokio::select! {
                command = self.commands.recv(), if self.commands_open => Wake::Command(command),
                result = connecting(&mut self.connecting) => Wake::Connected(result),
                frame = next_frame(&mut self.stream) => Wake::Frame(frame),
                () = reconnect_due(self.reconnect_at) => Wake::ReconnectDue,
            };
            self.handle(wake).await;
        }

        lifecycle!(self.config.debug, "Socket driver stopped");
    }

    fn finished(&self) -> bool {
        self.state.is_torn_down() && self.stream.is_none() && self.connecting.is_none()
    }

    async fn handle(&mut self, wake: Wake) {
        match wake {
            Wake::Command(Some(Command::Connect)) => {
                if self.state.ready_state.is_active() {
                    warn!(ready_state = %self.state.ready_state, "Connect ignored, session already active");
                }
                self.dispatch(SocketEvent::Connect).await;
            }
            Wake::Command(Some(Command::Send(text))) => self.transmit(text).await,
            Wake::Command(Some(Command::Shutdown)) => self.dispatch(SocketEvent::Teardown).await,
            Wake::Command(None) => {
                self.commands_open = false;
                self.dispatch(SocketEvent::Teardown).await;
            }
            Wake::Connected(result) => {
                self.connecting = None;
                match result {
                    Ok(stream) => {
                        self.stream = Some(stream);
                        self.peer_close = None;
                        lifecycle!(self.config.debug, "Socket open");
                        self.dispatch(SocketEvent::Opened).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "Socket handshake failed");
                        self.dispatch(SocketEvent::Error(e.to_string())).await;
                        self.dispatch(SocketEvent::Closed(CloseInfo::abnormal())).await;
                    }
                }
            }
            Wake::Frame(Some(Ok(message))) => self.receive(message).await,
            Wake::Frame(Some(Err(e))) => {
                self.stream = None;
                if !matches!(
                    e,
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
                ) {
                    warn!(error = %e, "Socket read failed");
                    self.dispatch(SocketEvent::Error(e.to_string())).await;
                }
                self.transport_ended().await;
            }
            Wake::Frame(None) => {
                self.stream = None;
                self.transport_ended().await;
            }
            Wake::ReconnectDue => {
                self.reconnect_at = None;
                self.dispatch(SocketEvent::ReconnectDue).await;
            }
        }
    }

    async fn receive(&mut self, message: Message) {
        match message {
            Message::Text(text) => self.dispatch(SocketEvent::Frame(RawFrame::Text(text))).await,
            Message::Binary(bytes) => {
                self.dispatch(SocketEvent::Frame(RawFrame::Binary(bytes))).await;
            }
            Message::Close(frame) => {
                let info = match frame {
                    Some(frame) => CloseInfo::from_frame(frame.code.into(), frame.reason.into_owned()),
                    None => CloseInfo::from_frame(CloseCode::NoStatus.as_u16(), ""),
                };
                lifecycle!(self.config.debug, close = %info, "Peer closed socket");
                // The stream ends after the reply is flushed
                self.peer_close = Some(info);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }

    async fn transmit(&mut self, text: String) {
        if self.state.ready_state != ReadyState::Open {
            debug!(ready_state = %self.state.ready_state, "Socket not open, dropping outgoing message");
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        if let Err(e) = stream.send(Message::Text(text)).await {
            warn!(error = %e, "Socket send failed");
            self.stream = None;
            self.dispatch(SocketEvent::Error(e.to_string())).await;
            self.transport_ended().await;
        }
    }

    async fn transport_ended(&mut self) {
        let info = self.peer_close.take().unwrap_or_else(CloseInfo::abnormal);
        lifecycle!(self.config.debug, close = %info, "Socket closed");
        self.dispatch(SocketEvent::Closed(info)).await;
    }

    /// Run `event` and everything it triggers through the state machine
    async fn dispatch(&mut self, event: SocketEvent) {
        self.inbox.push_back(event);

        while let Some(event) = self.inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let Transition { state, effects } = machine::transition(state, event, &self.policy);
            self.state = state;

            for effect in effects {
                self.perform(effect).await;
            }
            self.publish();
        }
    }

    async fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::OpenTransport => {
                lifecycle!(
                    self.config.debug,
                    attempt = self.state.reconnect_attempts,
                    "Opening socket"
                );
                let url = self.config.url.clone();
                self.connecting = Some(
                    async move {
                        tokio_tungstenite::connect_async(url)
                            .await
                            .map(|(stream, _response)| stream)
                    }
                    .boxed(),
                );
            }
            Effect::CloseTransport => self.close_transport().await,
            Effect::ScheduleReconnect(delay) => {
                lifecycle!(
                    self.config.debug,
                    attempt = self.state.reconnect_attempts,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Reconnect scheduled"
                );
                self.reconnect_at = Some(Instant::now() + delay);
            }
            Effect::CancelReconnect => self.reconnect_at = None,
            Effect::Deliver(message) => {
                if self.messages.send(message).is_err() {
                    trace!("No message subscribers");
                }
            }
            Effect::ReconnectExhausted => {
                warn!(
                    attempts = self.state.reconnect_attempts,
                    "Reconnect attempts exhausted, waiting for an explicit connect"
                );
            }
        }
    }

    async fn close_transport(&mut self) {
        self.connecting = None;
        if let Some(mut stream) = self.stream.take() {
            match time::timeout(self.config.close_timeout, stream.close(None)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "Close handshake failed"),
                Err(_) => debug!("Close handshake timed out"),
            }
        }
        self.inbox
            .push_back(SocketEvent::Closed(CloseInfo::local_shutdown()));
    }

    fn publish(&self) {
        let next = self.state.snapshot(self.session_id);
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn connecting(pending: &mut Option<ConnectFuture>) -> Result<WsStream, tungstenite::Error> {
    match pending.as_mut() {
        Some(handshake) => handshake.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(stream: &mut Option<WsStream>) -> Option<Result<Message, tungstenite::Error>> {
    match stream.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn reconnect_due(at: Option<Instant>) {
    match at {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
