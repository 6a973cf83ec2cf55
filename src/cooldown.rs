use std::time::{Duration, Instant};

use crate::core::clock::{SystemClock, TimeSource};
use crate::core::timer::Interval;

/// How often a running cooldown re-reads the clock
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Reported by `CooldownGate::tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownEvent {
    /// Still cooling down
    Remaining(u64),
    /// Reached zero; the gate is idle again and its tick is stopped
    Expired,
}

/// Local rate limiter between successful placements
///
/// Remaining time is always recomputed from the deadline and the clock,
/// never decremented, so a slow or skipped tick cannot drift it.
pub struct CooldownGate {
    clock: Box<dyn TimeSource>,
    until: Option<Instant>,
    ticker: Interval,
}

impl CooldownGate {
    pub fn new(clock: Box<dyn TimeSource>, tick: Duration) -> Self {
        Self {
            clock,
            until: None,
            ticker: Interval::new(tick),
        }
    }

    /// Gate on the system clock with the default tick
    pub fn system() -> Self {
        Self::new(Box::new(SystemClock), DEFAULT_TICK)
    }

    /// Start (or restart) a cooldown of whole seconds
    pub fn start(&mut self, seconds: u32) {
        self.start_for(Duration::from_secs(seconds as u64));
    }

    pub fn start_for(&mut self, duration: Duration) {
        let now = self.clock.now();
        self.until = Some(now + duration);
        self.ticker.start(now);
        log::debug!("cooldown started for {:?}", duration);
    }

    /// Cancel the tick and clear the deadline. Safe when idle.
    pub fn stop(&mut self) {
        self.ticker.stop();
        self.until = None;
    }

    pub fn is_active(&self) -> bool {
        self.remaining_seconds() > 0
    }

    /// Whole seconds left, rounded up
    pub fn remaining_seconds(&self) -> u64 {
        let Some(until) = self.until else {
            return 0;
        };
        let left = until.saturating_duration_since(self.clock.now());
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    /// Poll from the event loop; fires at most once per tick period
    pub fn tick(&mut self) -> Option<CooldownEvent> {
        if !self.ticker.poll(self.clock.now()) {
            return None;
        }

        match self.remaining_seconds() {
            0 => {
                self.stop();
                log::debug!("cooldown expired");
                Some(CooldownEvent::Expired)
            }
            remaining => Some(CooldownEvent::Remaining(remaining)),
        }
    }

    /// Whether the periodic tick is still armed
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Short label for a toolbar: `"3s"` or `"Ready"`
    pub fn label(&self) -> String {
        match self.remaining_seconds() {
            0 => "Ready".to_string(),
            n => format!("{n}s"),
        }
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for CooldownGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownGate")
            .field("until", &self.until)
            .field("ticking", &self.ticker.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn manual_gate() -> (CooldownGate, ManualClock) {
        let clock = ManualClock::new();
        (CooldownGate::new(Box::new(clock.clone()), DEFAULT_TICK), clock)
    }

    #[test]
    fn inactive_before_start() {
        let (gate, _) = manual_gate();
        assert!(!gate.is_active());
        assert_eq!(gate.remaining_seconds(), 0);
        assert_eq!(gate.label(), "Ready");
    }

    #[test]
    fn remaining_rounds_up_and_never_increases() {
        let (mut gate, clock) = manual_gate();
        gate.start(3);
        assert_eq!(gate.remaining_seconds(), 3);

        let mut previous = gate.remaining_seconds();
        for _ in 0..31 {
            clock.advance(Duration::from_millis(100));
            let now = gate.remaining_seconds();
            assert!(now <= previous);
            previous = now;
        }

        assert_eq!(gate.remaining_seconds(), 0);
        assert!(!gate.is_active());
    }

    #[test]
    fn partial_second_counts_as_one() {
        let (mut gate, clock) = manual_gate();
        gate.start(1);
        clock.advance(Duration::from_millis(999));
        assert_eq!(gate.remaining_seconds(), 1);
        assert_eq!(gate.label(), "1s");
    }

    #[test]
    fn tick_fires_at_most_once_per_period() {
        let (mut gate, clock) = manual_gate();
        gate.start(2);

        assert_eq!(gate.tick(), None);
        clock.advance(Duration::from_millis(100));
        assert_eq!(gate.tick(), Some(CooldownEvent::Remaining(2)));
        assert_eq!(gate.tick(), None);
    }

    #[test]
    fn tick_reports_expiry_and_stops() {
        let (mut gate, clock) = manual_gate();
        gate.start(1);

        clock.advance(Duration::from_millis(1_050));
        assert_eq!(gate.tick(), Some(CooldownEvent::Expired));
        assert!(!gate.is_ticking());

        clock.advance(Duration::from_secs(1));
        assert_eq!(gate.tick(), None);
    }

    #[test]
    fn late_tick_recomputes_from_clock() {
        let (mut gate, clock) = manual_gate();
        gate.start(5);

        // Event loop stalled for most of the cooldown
        clock.advance(Duration::from_millis(4_500));
        assert_eq!(gate.tick(), Some(CooldownEvent::Remaining(1)));
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut gate, _) = manual_gate();
        gate.stop();
        gate.start(3);
        gate.stop();
        gate.stop();
        assert!(!gate.is_active());
        assert!(!gate.is_ticking());
    }

    #[test]
    fn restart_replaces_deadline() {
        let (mut gate, clock) = manual_gate();
        gate.start(1);
        clock.advance(Duration::from_millis(900));
        gate.start(3);
        assert_eq!(gate.remaining_seconds(), 3);
    }

    #[test]
    fn system_clock_expires_in_real_time() {
        let mut gate = CooldownGate::new(Box::new(SystemClock), Duration::from_millis(10));
        gate.start_for(Duration::from_millis(50));
        assert!(gate.is_active());

        std::thread::sleep(Duration::from_millis(80));
        assert!(!gate.is_active());
        assert_eq!(gate.tick(), Some(CooldownEvent::Expired));
    }
}
