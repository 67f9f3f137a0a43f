//! Bounded polling against an external condition.
//!
//! Every wait in the installer is the same shape: run a probe, stop early
//! on success or a terminal failure, otherwise sleep and retry until a
//! window elapses. `poll_until` is that loop; callers supply the probe.

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of time for polling loops. Swappable so waits can be tested
/// without sleeping.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

// ---------------------------------------------------------------------------
// Probe / PollOutcome
// ---------------------------------------------------------------------------

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    Ready(T),
    Failed(T),
    Pending(T),
}

/// Terminal result of a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    Failed(T),
    /// The window elapsed. Carries the last pending observation.
    TimedOut(T),
}

/// Run `probe` immediately and then every `interval` until it returns
/// `Ready` or `Failed`, or until `window` has elapsed since the first probe.
///
/// A zero `interval` is treated as one second so a misconfigured wait
/// cannot spin.
pub fn poll_until<T, F>(
    clock: &dyn Clock,
    interval: Duration,
    window: Duration,
    mut probe: F,
) -> PollOutcome<T>
where
    F: FnMut() -> Probe<T>,
{
    let interval = if interval.is_zero() {
        Duration::from_secs(1)
    } else {
        interval
    };
    let start = clock.now();
    loop {
        let last = match probe() {
            Probe::Ready(v) => return PollOutcome::Ready(v),
            Probe::Failed(v) => return PollOutcome::Failed(v),
            Probe::Pending(v) => v,
        };
        let elapsed = clock.now().saturating_duration_since(start);
        if elapsed >= window {
            return PollOutcome::TimedOut(last);
        }
        clock.sleep(interval.min(window - elapsed));
    }
}
