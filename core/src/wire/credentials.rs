use crate::prelude::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};

/// Credential pair obtained from the external authentication flow and sent
/// once as the handshake message immediately after the transport opens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub pin: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            pin: pin.into(),
        }
    }

    /// Serialized handshake payload.
    pub fn to_handshake(&self) -> FeedResult<String> {
        serde_json::to_string(self).map_err(|e| FeedError::Transport(e.to_string()))
    }

    /// Parses a handshake payload received by the gateway side.
    pub fn from_handshake(raw: &str) -> FeedResult<Self> {
        serde_json::from_str(raw).map_err(|e| FeedError::MalformedFrame(e.to_string()))
    }

    /// Minimal gateway-side sanity check before any frames flow.
    pub fn validate(&self) -> FeedResult<()> {
        if self.email.trim().is_empty() {
            return Err(FeedError::MalformedFrame("empty email".into()));
        }
        if self.pin.trim().is_empty() {
            return Err(FeedError::MalformedFrame("empty pin".into()));
        }
        Ok(())
    }
}
