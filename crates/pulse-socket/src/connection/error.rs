//! Socket manager errors
//!
//! Only caller misuse surfaces here. Transport failures are recorded on the
//! session and drive reconnects instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Invalid socket URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid socket configuration: {0}")]
    InvalidConfig(String),

    #[error("Socket manager requires a running tokio runtime")]
    NoRuntime,

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Socket manager has shut down")]
    ManagerClosed,
}

impl SocketError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "INVALID_URL",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoRuntime => "NO_RUNTIME",
            Self::Serialize(_) => "SERIALIZE_ERROR",
            Self::ManagerClosed => "MANAGER_CLOSED",
        }
    }
}
