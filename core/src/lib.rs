//! Streaming-client core for the Rust motion-telemetry platform.
//!
//! The modules mirror the legacy browser feed client while providing safe
//! abstractions: a bounded sample window, an edge-triggered vibration
//! debouncer, and the connection state machine that drives them.

pub mod math;
pub mod prelude;
pub mod stream;
pub mod telemetry;
pub mod wire;

pub use prelude::{ClientConfig, FeedError, FeedResult};
pub use stream::{AlertDebouncer, ClientHandle, FeedEvent, SampleBuffer, StreamClient};
pub use wire::{Credentials, Sample};
