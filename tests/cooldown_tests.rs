use std::time::{Duration, Instant};

use pixel_canvas::cooldown::{CooldownEvent, CooldownGate};
use pixel_canvas::core::{ManualClock, SystemClock};

#[cfg(test)]
mod cooldown_tests {
    use super::*;

    #[test]
    fn test_inactive_before_start() {
        let gate = CooldownGate::new(Box::new(SystemClock), Duration::from_millis(10));
        assert!(!gate.is_active());
        assert_eq!(gate.remaining_seconds(), 0);
        assert_eq!(gate.label(), "Ready");
    }

    #[test]
    fn test_real_time_countdown_reaches_zero() {
        let mut gate = CooldownGate::new(Box::new(SystemClock), Duration::from_millis(10));
        let started = Instant::now();
        gate.start(3);
        assert!(gate.is_active());
        assert!(gate.remaining_seconds() <= 3);

        let mut last = gate.remaining_seconds();
        while gate.is_active() {
            assert!(started.elapsed() < Duration::from_millis(3100), "cooldown overran");
            std::thread::sleep(Duration::from_millis(20));
            gate.tick();

            let now = gate.remaining_seconds();
            assert!(now <= last);
            last = now;
        }

        assert_eq!(gate.remaining_seconds(), 0);
        assert!(started.elapsed() >= Duration::from_millis(2900));
    }

    #[test]
    fn test_tick_reports_then_expires_once() {
        let clock = ManualClock::new();
        let mut gate = CooldownGate::new(Box::new(clock.clone()), Duration::from_millis(100));
        gate.start(2);

        clock.advance(Duration::from_millis(100));
        assert_eq!(gate.tick(), Some(CooldownEvent::Remaining(2)));

        clock.advance(Duration::from_millis(1000));
        assert_eq!(gate.tick(), Some(CooldownEvent::Remaining(1)));

        clock.advance(Duration::from_millis(1000));
        assert_eq!(gate.tick(), Some(CooldownEvent::Expired));
        assert!(!gate.is_ticking());

        clock.advance(Duration::from_secs(5));
        assert_eq!(gate.tick(), None);
    }

    #[test]
    fn test_restart_replaces_deadline() {
        let clock = ManualClock::new();
        let mut gate = CooldownGate::new(Box::new(clock.clone()), Duration::from_millis(100));

        gate.start(5);
        clock.advance(Duration::from_secs(4));
        gate.start(2);
        assert_eq!(gate.remaining_seconds(), 2);

        gate.stop();
        gate.stop();
        assert!(!gate.is_active());
    }
}
