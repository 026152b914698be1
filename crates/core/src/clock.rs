//! Clock abstraction — wall-clock time for expiry/rate-limit windows,
//! monotonic time for internal pingers.
//!
//! Sweepers and expiry checks take a `RelayClock` rather than calling
//! `chrono::Utc::now()`/`Instant::now()` directly so tests can advance time
//! without sleeping.

use chrono::{DateTime, Utc};
use std::time::Instant;

/// Source of wall-clock and monotonic time.
pub trait RelayClock: Send + Sync {
    /// Current wall-clock time, used for session/version timestamps.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current monotonic instant, used for rate-limit windows and pingers.
    fn now_monotonic(&self) -> Instant;
}

/// The real clock, backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl RelayClock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_monotonic(&self) -> Instant {
        Instant::now()
    }
}

/// A test double whose wall-clock time can be advanced manually.
///
/// Monotonic time is still read from the OS — only the wall-clock side is
/// controllable, since session/version expiry are all wall-clock bound.
pub struct FrozenClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl FrozenClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += delta;
    }
}

impl RelayClock for FrozenClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn now_monotonic(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_clock_advances() {
        let start = Utc::now();
        let clock = FrozenClock::new(start);
        assert_eq!(clock.now_utc(), start);
        clock.advance(chrono::Duration::days(1));
        assert_eq!(clock.now_utc(), start + chrono::Duration::days(1));
    }

    #[test]
    fn system_clock_advances_in_real_time() {
        let clock = SystemClock;
        let first = clock.now_monotonic();
        let second = clock.now_monotonic();
        assert!(second >= first);
    }
}
