use crate::stream::events::FeedEvent;
use log::{debug, info, warn};

/// Centralized logging for connection lifecycle and per-frame diagnostics.
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    /// One line per emitted event; samples are demoted to debug so the feed
    /// stays readable at info level.
    pub fn event(&self, event: &FeedEvent) {
        match event {
            FeedEvent::SampleReceived(sample) => debug!(
                "sample t={:.0} magnitude={:.3}",
                sample.time, sample.accel_magnitude
            ),
            FeedEvent::DecodeError(raw) => warn!("dropped malformed frame: {}", raw),
            other => info!("{:?}", other),
        }
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
