use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

pub enum AppEvent {
    Key(KeyEvent),
    /// The wait elapsed without input; due timer ticks should be delivered.
    Tick,
    Resize,
}

/// Blocking terminal event source. Each wait is bounded by the next timer
/// deadline (and an idle cap) so countdown ticks are never late by more than
/// one poll.
pub struct EventSource {
    idle_timeout: Duration,
}

impl EventSource {
    pub fn new(idle_timeout: Duration) -> Self {
        Self { idle_timeout }
    }

    pub fn next(&self, deadline: Option<Instant>) -> anyhow::Result<AppEvent> {
        let timeout = wait_budget(self.idle_timeout, deadline, Instant::now());
        if !event::poll(timeout)? {
            return Ok(AppEvent::Tick);
        }
        Ok(match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
            Event::Resize(_, _) => AppEvent::Resize,
            _ => AppEvent::Tick,
        })
    }
}

fn wait_budget(idle: Duration, deadline: Option<Instant>, now: Instant) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(now).min(idle),
        None => idle,
    }
}
