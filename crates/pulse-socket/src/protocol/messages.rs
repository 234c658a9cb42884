//! Incoming message decoding
//!
//! Payloads are decoded as JSON when possible. Anything else is handed to
//! consumers unchanged, so a malformed payload is never lost.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A raw frame read off the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// A message delivered to consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    /// Payload parsed as JSON
    Json(Value),
    /// Text payload that is not valid JSON
    Text(String),
    /// Binary payload that is not valid UTF-8
    Binary(Vec<u8>),
}

impl IncomingMessage {
    /// Decode a raw frame, falling back to the raw payload
    #[must_use]
    pub fn decode(frame: RawFrame) -> Self {
        match frame {
            RawFrame::Text(text) => Self::decode_text(text),
            RawFrame::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Self::decode_text(text),
                Err(e) => Self::Binary(e.into_bytes()),
            },
        }
    }

    fn decode_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }

    /// Whether the payload decoded as JSON
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Try to read the JSON payload as `T`
    pub fn parse<T: DeserializeOwned>(&self) -> Option<T> {
        self.as_json()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl std::fmt::Display for IncomingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}
