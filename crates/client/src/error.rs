//! Client error taxonomy.
//!
//! Nothing here is fatal to the process: connection errors recover via the
//! channel's reconnect loop, malformed messages are discarded by the
//! normalizer, and stale action submissions are rejected before any network
//! call. These variants cover the remaining, caller-visible failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("connection failed: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Domain(#[from] outbreak_domain::DomainError),

    /// Host-only intents (start, kick) attempted by a non-host player.
    #[error("only the host may {0}")]
    NotHost(&'static str),
}
