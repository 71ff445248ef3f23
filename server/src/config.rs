//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::delivery::QueueConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API bind address (e.g., "0.0.0.0:8000")
    pub bind_address: String,

    /// Standalone subscriber WebSocket bind address (e.g., "0.0.0.0:8080")
    pub ws_bind_address: String,

    /// Minimum spacing between outbound sends (default: 1000ms)
    pub send_interval: Duration,

    /// Per-send timeout (optional, unbounded when unset)
    pub send_timeout: Option<Duration>,

    /// Session bridge base URL
    pub session_bridge_url: String,

    /// Session bridge bearer token (optional)
    pub session_bridge_token: Option<String>,

    /// Outbound frame buffer per WebSocket subscriber
    pub subscriber_buffer: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = parse_var::<u16>("PORT")?.unwrap_or(8000);
        let ws_port = parse_var::<u16>("WS_PORT")?.unwrap_or(8080);

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| format!("0.0.0.0:{port}")),
            ws_bind_address: env::var("WS_BIND_ADDRESS")
                .unwrap_or_else(|_| format!("0.0.0.0:{ws_port}")),
            send_interval: Duration::from_millis(
                parse_var::<u64>("SEND_INTERVAL_MS")?.unwrap_or(1000),
            ),
            send_timeout: parse_var::<u64>("SEND_TIMEOUT_SECS")?.map(Duration::from_secs),
            session_bridge_url: env::var("SESSION_BRIDGE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3001".into()),
            session_bridge_token: env::var("SESSION_BRIDGE_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            subscriber_buffer: parse_var::<usize>("SUBSCRIBER_BUFFER")?.unwrap_or(32),
        })
    }

    /// Delivery queue settings derived from this configuration.
    #[must_use]
    pub const fn queue_config(&self) -> QueueConfig {
        QueueConfig::new(self.send_interval).with_send_timeout(self.send_timeout)
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            ws_bind_address: "127.0.0.1:0".into(),
            send_interval: Duration::from_millis(10),
            send_timeout: None,
            session_bridge_url: "http://127.0.0.1:3001".into(),
            session_bridge_token: None,
            subscriber_buffer: 8,
        }
    }
}

/// Read and parse an optional variable. Set-but-unparseable is an error.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a valid number, got {raw:?}")),
        Err(_) => Ok(None),
    }
}
