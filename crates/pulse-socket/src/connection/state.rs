//! Connection session state
//!
//! Everything the state machine reads and writes, plus the snapshot type
//! published to observers.

use crate::protocol::{CloseInfo, IncomingMessage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle stage of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    #[default]
    Closed,
}

impl ReadyState {
    /// Whether a transport exists or is being established
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded transport failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportError {
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// State owned by a single connection session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub ready_state: ReadyState,
    pub reconnect_attempts: u32,
    pub last_error: Option<TransportError>,
    pub last_message: Option<IncomingMessage>,
    pub last_close: Option<CloseInfo>,
    pub(crate) reconnect_pending: bool,
    pub(crate) exhausted: bool,
    pub(crate) torn_down: bool,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reconnect timer is armed
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Automatic reconnects ran out; only an explicit connect restarts
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Build the snapshot published to observers
    #[must_use]
    pub fn snapshot(&self, session_id: Uuid) -> SocketSnapshot {
        SocketSnapshot {
            session_id,
            ready_state: self.ready_state,
            reconnect_attempts: self.reconnect_attempts,
            last_error: self.last_error.clone(),
            last_message: self.last_message.clone(),
            last_close: self.last_close.clone(),
            reconnect_pending: self.reconnect_pending,
            exhausted: self.exhausted,
            torn_down: self.torn_down,
        }
    }
}

/// Observable view of a socket session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocketSnapshot {
    pub session_id: Uuid,
    pub ready_state: ReadyState,
    pub reconnect_attempts: u32,
    pub last_error: Option<TransportError>,
    pub last_message: Option<IncomingMessage>,
    pub last_close: Option<CloseInfo>,
    pub reconnect_pending: bool,
    pub exhausted: bool,
    pub torn_down: bool,
}

impl SocketSnapshot {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ready_state == ReadyState::Open
    }
}
