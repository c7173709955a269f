use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    pub rate: f32,
    pub noise: f64,
    pub burst_every: u64,
    pub seed: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 9000,
            rate: 10.0,
            noise: 0.05,
            burst_every: 120,
            seed: 7,
        }
    }
}

impl GatewayConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading gateway config {}", path_ref.display()))?;
        let config: GatewayConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing gateway config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(port: u16, rate: f32, noise: f64, burst_every: u64, seed: u64) -> Self {
        Self {
            port,
            rate,
            noise,
            burst_every,
            seed,
        }
    }

    /// Tick interval between frames; a non-positive rate falls back to the
    /// default cadence.
    pub fn frame_interval(&self) -> Duration {
        let rate = if self.rate > 0.0 { self.rate } else { 10.0 };
        Duration::from_millis(((1000.0 / rate) as u64).max(1))
    }
}
