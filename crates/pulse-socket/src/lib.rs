//! # pulse-socket
//!
//! Resilient WebSocket client. One [`SocketManager`] keeps a single logical
//! connection alive, reconnecting at a fixed interval up to a bounded number
//! of attempts, and delivers incoming payloads decoded as JSON with a raw
//! text fallback.

pub mod connection;
pub mod protocol;

pub use connection::{
    ReadyState, ReconnectPolicy, SessionState, SocketConfig, SocketConfigBuilder, SocketError,
    SocketManager, SocketSnapshot, TransportError,
};
pub use protocol::{CloseCode, CloseInfo, IncomingMessage, RawFrame};
