//! Client configuration.
//!
//! Defaults are production values; the `OUTBREAK_*` environment variables
//! override them (endpoint, reconnect delay, buffers, confirmation timeout).
//! The reconnect delay is a fixed interval, not a backoff curve - the
//! default sits inside the 3-5 s window the server operators expect.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Websocket endpoint, e.g. `ws://play.example.net/ws`.
    pub endpoint: String,
    /// Fixed delay between reconnect attempts, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Outbound frame buffer; frames beyond this are dropped, not queued.
    pub send_buffer: usize,
    /// How long an optimistic local action waits for confirmation before it
    /// is discarded, in milliseconds.
    pub confirm_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8080/ws".to_string(),
            reconnect_delay_ms: 4_000,
            send_buffer: 32,
            confirm_timeout_ms: 5_000,
        }
    }
}

impl ClientConfig {
    /// Load defaults overridden by `OUTBREAK_*` environment variables
    /// (`OUTBREAK_ENDPOINT`, `OUTBREAK_RECONNECT_DELAY_MS`, ...).
    pub fn load() -> Result<Self, ClientError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("OUTBREAK"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_delay_is_inside_the_expected_window() {
        let config = ClientConfig::default();
        assert!((3_000..=5_000).contains(&config.reconnect_delay_ms));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ClientConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config, ClientConfig::default());
    }
}
