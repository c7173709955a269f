use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One synthetic reading in the gateway wire schema: six raw axes under the
/// short keys real devices publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionFrame {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub oa: f64,
    pub ob: f64,
    pub og: f64,
}

/// Deterministic synthetic motion: smooth sinusoidal sway plus seeded
/// jitter, with a periodic high-vibration burst so downstream alert
/// handling can be exercised end to end.
pub struct FrameGenerator {
    rng: StdRng,
    noise: f64,
    burst_every: u64,
    tick: u64,
}

impl FrameGenerator {
    pub fn new(noise: f64, burst_every: u64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            noise,
            burst_every,
            tick: 0,
        }
    }

    pub fn next_frame(&mut self) -> MotionFrame {
        let tick = self.tick;
        self.tick += 1;

        let phase = tick as f64 * 0.1;
        let burst = self.burst_every > 0 && tick % self.burst_every == self.burst_every - 1;

        let ax = if burst {
            // well past the default alert threshold regardless of phase
            25.0 + self.jitter()
        } else {
            4.0 * phase.sin() + self.jitter()
        };

        MotionFrame {
            ax,
            ay: 4.0 * (phase * 0.7).cos() + self.jitter(),
            az: 9.81 + self.jitter(),
            oa: 180.0 * (phase * 0.05).sin(),
            ob: 90.0 * (phase * 0.08).cos(),
            og: 45.0 * (phase * 0.11).sin(),
        }
    }

    fn jitter(&mut self) -> f64 {
        if self.noise > 0.0 {
            self.rng.gen_range(-self.noise..self.noise)
        } else {
            0.0
        }
    }
}
