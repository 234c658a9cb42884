//! Domain errors - error types for the notification layer
//!
//! Queue operations themselves never fail. These errors cover misuse at
//! construction time.

use thiserror::Error;

/// Notification layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Toast store requires a running tokio runtime")]
    NoRuntime,

    #[error("Invalid toast configuration: {0}")]
    InvalidConfig(String),
}

impl DomainError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoRuntime => "NO_RUNTIME",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// Check if this error comes from how the store was set up
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::NoRuntime | Self::InvalidConfig(_))
    }
}
