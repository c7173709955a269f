pub mod buffer;
pub mod client;
pub mod debounce;
pub mod events;

pub use buffer::SampleBuffer;
pub use client::{ClientHandle, ConnectionState, StreamClient};
pub use debounce::{AlertDebouncer, AlertState};
pub use events::FeedEvent;
