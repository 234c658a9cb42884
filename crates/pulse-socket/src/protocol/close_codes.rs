//! WebSocket close codes
//!
//! Standard RFC 6455 close codes and the close record kept on a session.

use serde::{Deserialize, Serialize};

/// Standard WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Normal closure
    Normal = 1000,
    /// Endpoint is going away (server shutdown, page navigation)
    GoingAway = 1001,
    /// Protocol error
    ProtocolError = 1002,
    /// Received a data type it cannot accept
    Unsupported = 1003,
    /// Close frame carried no status code
    NoStatus = 1005,
    /// Connection dropped without a close frame
    Abnormal = 1006,
    /// Message data was inconsistent with its type
    InvalidPayload = 1007,
    /// Message violated endpoint policy
    PolicyViolation = 1008,
    /// Message too big to process
    MessageTooBig = 1009,
    /// Server encountered an unexpected condition
    InternalError = 1011,
    /// Server is restarting
    ServiceRestart = 1012,
    /// Server is overloaded, try again later
    TryAgainLater = 1013,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1000 => Some(Self::Normal),
            1001 => Some(Self::GoingAway),
            1002 => Some(Self::ProtocolError),
            1003 => Some(Self::Unsupported),
            1005 => Some(Self::NoStatus),
            1006 => Some(Self::Abnormal),
            1007 => Some(Self::InvalidPayload),
            1008 => Some(Self::PolicyViolation),
            1009 => Some(Self::MessageTooBig),
            1011 => Some(Self::InternalError),
            1012 => Some(Self::ServiceRestart),
            1013 => Some(Self::TryAgainLater),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Normal closure",
            Self::GoingAway => "Endpoint going away",
            Self::ProtocolError => "Protocol error",
            Self::Unsupported => "Unsupported data",
            Self::NoStatus => "No status received",
            Self::Abnormal => "Abnormal closure",
            Self::InvalidPayload => "Invalid payload data",
            Self::PolicyViolation => "Policy violation",
            Self::MessageTooBig => "Message too big",
            Self::InternalError => "Internal server error",
            Self::ServiceRestart => "Service restart",
            Self::TryAgainLater => "Try again later",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

/// How a transport ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
    /// Whether a close frame was exchanged
    pub was_clean: bool,
}

impl CloseInfo {
    /// Close initiated by a received close frame
    pub fn from_frame(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean: true,
        }
    }

    /// Transport dropped or failed to open
    #[must_use]
    pub fn abnormal() -> Self {
        Self {
            code: CloseCode::Abnormal.as_u16(),
            reason: String::new(),
            was_clean: false,
        }
    }

    /// Close initiated locally during teardown
    #[must_use]
    pub fn local_shutdown() -> Self {
        Self::from_frame(CloseCode::Normal.as_u16(), "client shutdown")
    }

    /// Known close code, if the peer used a standard one
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        CloseCode::from_u16(self.code)
    }
}

impl std::fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.close_code() {
            Some(code) => write!(f, "{code}")?,
            None => write!(f, "code {}", self.code)?,
        }
        if !self.reason.is_empty() {
            write!(f, ": {}", self.reason)?;
        }
        Ok(())
    }
}
