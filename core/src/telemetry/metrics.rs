use std::sync::Mutex;

/// Session counters shared between the client task and status consumers.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

struct Metrics {
    samples: usize,
    decode_errors: usize,
    reconnects: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics {
                samples: 0,
                decode_errors: 0,
                reconnects: 0,
            }),
        }
    }

    pub fn record_sample(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.samples += 1;
        }
    }

    pub fn record_decode_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.decode_errors += 1;
        }
    }

    pub fn record_reconnect(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.reconnects += 1;
        }
    }

    /// (samples, decode errors, reconnect attempts)
    pub fn snapshot(&self) -> (usize, usize, usize) {
        if let Ok(metrics) = self.inner.lock() {
            (metrics.samples, metrics.decode_errors, metrics.reconnects)
        } else {
            (0, 0, 0)
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
