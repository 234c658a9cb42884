//! Application error types
//!
//! Unified error handling for binaries built on the pulse crates.

use crate::config::ConfigError;
use crate::telemetry::TracingError;
use pulse_core::DomainError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Real-time connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for logs and exit reporting
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Tracing(_) => "TRACING_ERROR",
            Self::Domain(e) => e.code(),
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if the error comes from how the program was set up rather than
    /// from something that happened at runtime
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        match self {
            Self::Config(_) | Self::Tracing(_) | Self::InvalidInput(_) => true,
            Self::Domain(e) => e.is_misuse(),
            Self::Connection(_) | Self::Internal(_) => false,
        }
    }

    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_setup_error() {
            2
        } else {
            1
        }
    }

    /// Create a connection error
    #[must_use]
    pub fn connection(msg: impl fmt::Display) -> Self {
        Self::Connection(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
