use std::time::{Duration, Instant};

/// Alert lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Quiet,
    Alerting,
}

/// Edge-triggered vibration gate. Fires once per quiet-to-alerting
/// transition and suppresses retriggers until the cooldown deadline passes;
/// sustained high magnitude neither re-raises nor extends the window.
pub struct AlertDebouncer {
    threshold: f64,
    cooldown: Duration,
    state: AlertState,
    deadline: Option<Instant>,
}

impl AlertDebouncer {
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            state: AlertState::Quiet,
            deadline: None,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Pending cooldown deadline, if an alert is active. The client's event
    /// loop sleeps until it; the cooldown may fire after disconnect.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Called once per decoded sample. Returns true when this call crossed
    /// the quiet-to-alerting edge.
    pub fn evaluate(&mut self, magnitude: f64, now: Instant) -> bool {
        if self.state == AlertState::Alerting || magnitude < self.threshold {
            return false;
        }
        self.state = AlertState::Alerting;
        self.deadline = Some(now + self.cooldown);
        true
    }

    /// Clears the alert once the cooldown deadline has passed. Returns true
    /// when this call performed the transition back to quiet.
    pub fn expire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.state = AlertState::Quiet;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
