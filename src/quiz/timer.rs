use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

/// One-second countdown ticker. It never mutates anything itself: the owner
/// asks how many whole seconds have elapsed since the last delivery and
/// applies that many ticks. Once stopped, no further ticks are reported.
#[derive(Clone, Debug)]
pub struct Countdown {
    started_at: Instant,
    delivered: u64,
    stopped: bool,
}

impl Countdown {
    pub fn start(now: Instant) -> Self {
        Self {
            started_at: now,
            delivered: 0,
            stopped: false,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Ticks that came due since the previous call, marked as delivered.
    pub fn due_ticks(&mut self, now: Instant) -> u64 {
        if self.stopped {
            return 0;
        }
        let elapsed = now.saturating_duration_since(self.started_at).as_secs();
        let due = elapsed.saturating_sub(self.delivered);
        self.delivered += due;
        due
    }

    /// When the next tick falls due, or `None` once stopped.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.stopped {
            return None;
        }
        Some(self.started_at + TICK * (self.delivered as u32 + 1))
    }

    /// Cancel pending ticks. Returns `true` only for the call that actually
    /// stopped a running countdown; later calls are harmless no-ops.
    pub fn stop(&mut self) -> bool {
        let was_running = !self.stopped;
        self.stopped = true;
        was_running
    }
}
