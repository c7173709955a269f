use serde::{Deserialize, Serialize};

/// Shared configuration for a streaming client session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    pub buffer_capacity: usize,
    pub alert_threshold: f64,
    pub alert_cooldown_ms: u64,
    pub reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:9000/websocket".to_string(),
            buffer_capacity: 400,
            alert_threshold: 20.0,
            alert_cooldown_ms: 2000,
            reconnect_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Common error type for feed operations.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_deployment_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.buffer_capacity, 400);
        assert_eq!(config.alert_threshold, 20.0);
        assert_eq!(config.alert_cooldown_ms, 2000);
        assert_eq!(config.reconnect_delay_ms, 1000);
    }

    #[test]
    fn with_url_keeps_defaults() {
        let config = ClientConfig::with_url("ws://example.net/websocket");
        assert_eq!(config.url, "ws://example.net/websocket");
        assert_eq!(config.buffer_capacity, 400);
    }
}
