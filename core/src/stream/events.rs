use crate::wire::Sample;
use serde::{Deserialize, Serialize};

/// Events delivered to feed consumers over the client's event channel.
/// Holding the receiving end of the channel is the observer registration;
/// the presentation layer never reaches into the client's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedEvent {
    ConnectionEstablished,
    ConnectionClosed,
    SampleReceived(Sample),
    DecodeError(String),
    AlertRaised,
    AlertCleared,
}
