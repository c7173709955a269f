use crate::wire::Sample;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Fixed-capacity FIFO window over the decoded sample stream.
///
/// Clones share the same backing store: the client task appends while
/// chart-style consumers take snapshots. Stored samples are immutable and
/// leave the window only through eviction.
#[derive(Clone)]
pub struct SampleBuffer {
    window: Arc<RwLock<VecDeque<Sample>>>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends at the tail, evicting from the head once the window is full.
    /// Always succeeds.
    pub fn append(&self, sample: Sample) {
        if let Ok(mut window) = self.window.write() {
            while window.len() >= self.capacity {
                window.pop_front();
            }
            window.push_back(sample);
        }
    }

    /// Ordered copy of the current window, taken wholly before or wholly
    /// after any concurrent append, never partially.
    pub fn snapshot(&self) -> Vec<Sample> {
        if let Ok(window) = self.window.read() {
            window.iter().cloned().collect()
        } else {
            Vec::new()
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        if let Ok(window) = self.window.read() {
            window.len()
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::with_capacity(400)
    }
}
