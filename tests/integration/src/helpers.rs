//! Test helpers for integration tests
//!
//! Provides a scripted WebSocket server and small utilities for waiting on
//! asynchronous conditions.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use pulse_socket::SocketConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Upper bound for any single wait in a test
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reconnect interval used by fast test configs
pub const FAST_RECONNECT: Duration = Duration::from_millis(50);

/// Close code the `/close-once` and `/close` routes send
pub const SERVER_CLOSE_CODE: u16 = 4000;

/// Counters observed by tests
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Upgrades accepted, across all routes
    pub accepted: AtomicUsize,
    /// Handshakes refused by `/reject`
    pub rejected: AtomicUsize,
    /// Server-side sockets that finished
    pub closed: AtomicUsize,
}

/// Local WebSocket server
///
/// Routes:
/// - `/echo` echoes text and binary frames
/// - `/greet` sends a JSON greeting, a plain text line and a non-UTF-8
///   binary frame, then echoes
/// - `/close-once` closes the first connection right after opening, then
///   behaves like `/echo`
/// - `/close` closes every connection right after opening
/// - `/reject` refuses the handshake with 503
pub struct TestServer {
    pub addr: SocketAddr,
    pub stats: Arc<ServerStats>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server on an ephemeral port
    pub async fn start() -> Result<Self> {
        let stats = Arc::new(ServerStats::default());

        let app = Router::new()
            .route("/echo", get(echo))
            .route("/greet", get(greet))
            .route("/close-once", get(close_once))
            .route("/close", get(close_always))
            .route("/reject", get(reject))
            .with_state(stats.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            stats,
            _handle: handle,
        })
    }

    /// WebSocket URL for a route
    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub fn accepted(&self) -> usize {
        self.stats.accepted.load(Ordering::SeqCst)
    }

    pub fn rejected(&self) -> usize {
        self.stats.rejected.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.stats.closed.load(Ordering::SeqCst)
    }
}

async fn echo(ws: WebSocketUpgrade, State(stats): State<Arc<ServerStats>>) -> Response {
    stats.accepted.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| echo_loop(socket, stats))
}

async fn greet(ws: WebSocketUpgrade, State(stats): State<Arc<ServerStats>>) -> Response {
    stats.accepted.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |mut socket| async move {
        let greeting = [
            Message::Text(r#"{"type":"hello","version":1}"#.to_string()),
            Message::Text("plain text line".to_string()),
            Message::Binary(vec![0xff, 0xfe, 0x00]),
        ];
        for message in greeting {
            if socket.send(message).await.is_err() {
                stats.closed.fetch_add(1, Ordering::SeqCst);
                return;
            }
        }
        echo_loop(socket, stats).await;
    })
}

async fn close_once(ws: WebSocketUpgrade, State(stats): State<Arc<ServerStats>>) -> Response {
    let first = stats.accepted.fetch_add(1, Ordering::SeqCst) == 0;
    ws.on_upgrade(move |socket| async move {
        if first {
            close_with_code(socket, stats).await;
        } else {
            echo_loop(socket, stats).await;
        }
    })
}

async fn close_always(ws: WebSocketUpgrade, State(stats): State<Arc<ServerStats>>) -> Response {
    stats.accepted.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| close_with_code(socket, stats))
}

async fn reject(State(stats): State<Arc<ServerStats>>) -> StatusCode {
    stats.rejected.fetch_add(1, Ordering::SeqCst);
    StatusCode::SERVICE_UNAVAILABLE
}

async fn echo_loop(mut socket: WebSocket, stats: Arc<ServerStats>) {
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(_) | Message::Binary(_) => {
                if socket.send(message).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    stats.closed.fetch_add(1, Ordering::SeqCst);
}

async fn close_with_code(mut socket: WebSocket, stats: Arc<ServerStats>) {
    let frame = CloseFrame {
        code: SERVER_CLOSE_CODE,
        reason: "server closing".into(),
    };
    if socket.send(Message::Close(Some(frame))).await.is_ok() {
        // Drain until the client answers the close
        while let Some(Ok(_)) = socket.recv().await {}
    }
    stats.closed.fetch_add(1, Ordering::SeqCst);
}

/// Socket config with a short reconnect interval
pub fn fast_config(url: impl Into<String>) -> SocketConfig {
    SocketConfig::builder(url)
        .reconnect_interval(FAST_RECONNECT)
        .close_timeout(Duration::from_millis(500))
        .build()
}

/// Await `future`, failing the test if it takes longer than [`TEST_TIMEOUT`]
pub async fn within<F: Future>(future: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, future).await {
        Ok(output) => output,
        Err(_) => panic!("timed out after {TEST_TIMEOUT:?}"),
    }
}

/// Poll `condition` until it holds, failing after [`TEST_TIMEOUT`]
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}
