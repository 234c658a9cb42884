//! Socket manager configuration

use super::error::SocketError;
use super::machine::ReconnectPolicy;
use pulse_common::SocketSettings;
use std::time::Duration;
use tokio_tungstenite::tungstenite::http::Uri;

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_MESSAGE_BUFFER: usize = 256;
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    /// Endpoint, `ws://` or `wss://`
    pub url: String,
    /// Log lifecycle changes at info instead of debug
    pub debug: bool,
    pub reconnect_interval: Duration,
    pub max_reconnect_attempts: u32,
    /// Capacity of the message broadcast channel
    pub message_buffer: usize,
    /// How long teardown waits for the close handshake
    pub close_timeout: Duration,
}

impl SocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            debug: false,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            message_buffer: DEFAULT_MESSAGE_BUFFER,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn builder(url: impl Into<String>) -> SocketConfigBuilder {
        SocketConfigBuilder {
            config: Self::new(url),
        }
    }

    /// Check the URL and channel sizing
    pub fn validate(&self) -> Result<(), SocketError> {
        let invalid = |reason: &str| SocketError::InvalidUrl {
            url: self.url.clone(),
            reason: reason.to_string(),
        };

        let uri = self
            .url
            .parse::<Uri>()
            .map_err(|e| invalid(&e.to_string()))?;
        match uri.scheme_str() {
            Some("ws" | "wss") => {}
            _ => return Err(invalid("scheme must be ws or wss")),
        }
        if uri.host().is_none_or(str::is_empty) {
            return Err(invalid("missing host"));
        }

        if self.message_buffer == 0 {
            return Err(SocketError::InvalidConfig(
                "message buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            interval: self.reconnect_interval,
            max_attempts: self.max_reconnect_attempts,
        }
    }
}

impl From<&SocketSettings> for SocketConfig {
    fn from(settings: &SocketSettings) -> Self {
        Self {
            debug: settings.debug,
            reconnect_interval: settings.reconnect_interval(),
            max_reconnect_attempts: settings.max_reconnect_attempts,
            ..Self::new(settings.url.clone())
        }
    }
}

/// Builder for [`SocketConfig`]
#[derive(Debug, Clone)]
pub struct SocketConfigBuilder {
    config: SocketConfig,
}

impl SocketConfigBuilder {
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect_interval = interval;
        self
    }

    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    #[must_use]
    pub fn message_buffer(mut self, capacity: usize) -> Self {
        self.config.message_buffer = capacity;
        self
    }

    #[must_use]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config.close_timeout = timeout;
        self
    }

    #[must_use]
    pub fn build(self) -> SocketConfig {
        self.config
    }
}
