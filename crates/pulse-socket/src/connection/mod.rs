//! Connection management
//!
//! The pure session state machine and the driver that runs it against a
//! real WebSocket transport.

mod config;
mod error;
pub mod machine;
mod manager;
mod state;

pub use config::{
    SocketConfig, SocketConfigBuilder, DEFAULT_CLOSE_TIMEOUT, DEFAULT_MAX_RECONNECT_ATTEMPTS,
    DEFAULT_MESSAGE_BUFFER, DEFAULT_RECONNECT_INTERVAL,
};
pub use error::SocketError;
pub use machine::{Effect, ReconnectPolicy, SocketEvent, Transition};
pub use manager::SocketManager;
pub use state::{ReadyState, SessionState, SocketSnapshot, TransportError};
