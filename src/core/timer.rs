/// Self-contained timers - each decides on its own when it fires
use std::time::{Duration, Instant};

/// Fixed rate timer driven by frame deltas - fires at specific Hz
#[derive(Debug, Clone, Copy)]
pub struct FixedHz {
    pub interval: f32,
    pub accumulator: f32,
}

impl FixedHz {
    /// Create timer that fires at given frequency
    pub fn new(hz: f32) -> Self {
        Self {
            interval: 1.0 / hz,
            accumulator: 0.0,
        }
    }

    /// Update with delta, returns true if should fire
    pub fn tick(&mut self, delta: f32) -> bool {
        self.accumulator += delta;

        if self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            true
        } else {
            false
        }
    }
}

/// Repeating wall-clock interval that can be started and cancelled.
/// Polled from the event loop; a late poll fires once, never in bursts.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
}

impl Interval {
    /// Create a stopped interval
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// (Re)arm so the first fire is one period after `now`
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    /// Cancel; safe when already stopped
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns true when a period has elapsed, and re-arms from `now`
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}
