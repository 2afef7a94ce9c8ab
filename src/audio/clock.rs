use std::time::{Duration, Instant};

/// Fixed-interval timer polled by the audio thread's receive loop.
///
/// Cancelling is synchronous: once `cancel` returns, `poll` stays false
/// until the next `start`.
#[derive(Debug, Clone)]
pub struct PositionClock {
    interval: Duration,
    next_due: Option<Instant>,
}

impl PositionClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// True when a tick is due; schedules the following one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// How long the loop may block before the next tick, capped at `idle`.
    pub fn timeout(&self, now: Instant, idle: Duration) -> Duration {
        match self.next_due {
            Some(due) => due.saturating_duration_since(now).min(idle),
            None => idle,
        }
    }
}
