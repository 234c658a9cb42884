//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file).

use pulse_core::ToastConfig;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub toast: ToastSettings,
    pub socket: SocketSettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Toast notification queue settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToastSettings {
    #[serde(default = "default_toast_limit")]
    pub limit: usize,
    #[serde(default = "default_remove_delay_ms")]
    pub remove_delay_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self {
            limit: default_toast_limit(),
            remove_delay_ms: default_remove_delay_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl From<&ToastSettings> for ToastConfig {
    fn from(settings: &ToastSettings) -> Self {
        Self {
            limit: settings.limit,
            remove_delay: Duration::from_millis(settings.remove_delay_ms),
            channel_capacity: settings.channel_capacity,
        }
    }
}

/// Real-time socket connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SocketSettings {
    pub url: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

impl SocketSettings {
    #[must_use]
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

// Default value functions
fn default_app_name() -> String {
    "pulse".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_toast_limit() -> usize {
    1
}

fn default_remove_delay_ms() -> u64 {
    5_000
}

fn default_channel_capacity() -> usize {
    64
}

fn default_reconnect_interval_ms() -> u64 {
    3_000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `SOCKET_URL` is missing or a value fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: match lookup("APP_ENV") {
                    Some(raw) => Environment::parse(&raw)
                        .ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
                    None => default_env(),
                },
            },
            toast: ToastSettings {
                limit: parse_var(&lookup, "TOAST_LIMIT")?.unwrap_or_else(default_toast_limit),
                remove_delay_ms: parse_var(&lookup, "TOAST_REMOVE_DELAY_MS")?
                    .unwrap_or_else(default_remove_delay_ms),
                channel_capacity: parse_var(&lookup, "TOAST_CHANNEL_CAPACITY")?
                    .unwrap_or_else(default_channel_capacity),
            },
            socket: SocketSettings {
                url: lookup("SOCKET_URL").ok_or(ConfigError::MissingVar("SOCKET_URL"))?,
                debug: parse_var(&lookup, "SOCKET_DEBUG")?.unwrap_or_default(),
                reconnect_interval_ms: parse_var(&lookup, "SOCKET_RECONNECT_INTERVAL_MS")?
                    .unwrap_or_else(default_reconnect_interval_ms),
                max_reconnect_attempts: parse_var(&lookup, "SOCKET_MAX_RECONNECT_ATTEMPTS")?
                    .unwrap_or_else(default_max_reconnect_attempts),
            },
        })
    }
}

/// Parse an optional variable, rejecting values that are present but malformed
fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
