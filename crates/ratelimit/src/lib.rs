//! Sliding-window rate limiter keyed by an arbitrary string (IP, `IP+":login"`, …).
//!
//! Windows are measured on wall-clock time (via the injected `RelayClock`),
//! matching expiry elsewhere in the relay and letting tests advance time
//! without sleeping. A single mutex guards the bucket map; acquisition is
//! expected to take microseconds. A background sweeper drops buckets whose
//! entire contents have expired, bounding memory to active keys.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use courtrelay_core::RelayClock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Buckets idle longer than this are dropped by the sweeper. No rate-limit
/// window in this relay exceeds one minute, so five is a generous margin.
const SWEEP_IDLE_THRESHOLD: ChronoDuration = ChronoDuration::minutes(5);

/// An in-memory sliding-window limiter. Never errors — it only denies.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
    clock: Arc<dyn RelayClock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn RelayClock>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Check whether `key` may proceed under `limit` requests per `window`.
    ///
    /// Drops stored timestamps older than `now - window`; succeeds iff the
    /// remaining count is `< limit`, recording `now` on success.
    pub fn allow(&self, key: &str, limit: usize, window: Duration) -> bool {
        let now = self.clock.now_utc();
        let window = ChronoDuration::from_std(window).unwrap_or(ChronoDuration::zero());
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        let timestamps = buckets.entry(key.to_string()).or_default();
        timestamps.retain(|t| now - *t < window);

        if timestamps.len() >= limit {
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Remove every bucket whose newest timestamp is older than the sweep
    /// threshold. Returns the number of buckets removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_utc();
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let before = buckets.len();
        buckets.retain(|_, timestamps| {
            timestamps
                .last()
                .is_some_and(|t| now - *t < SWEEP_IDLE_THRESHOLD)
        });
        before - buckets.len()
    }

    /// Number of tracked buckets (keys with at least one recent timestamp).
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Spawn the 5-minute sweeper task for `limiter`. Returns a handle the
/// caller can abort on shutdown.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            interval.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                debug!(removed, "rate limiter sweeper evicted stale buckets");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtrelay_core::FrozenClock;

    fn limiter() -> (RateLimiter, Arc<FrozenClock>) {
        let clock = Arc::new(FrozenClock::new(Utc::now()));
        let limiter = RateLimiter::new(clock.clone());
        (limiter, clock)
    }

    #[test]
    fn allows_up_to_limit() {
        let (limiter, _clock) = limiter();
        let window = Duration::from_secs(60);
        for _ in 0..5 {
            assert!(limiter.allow("1.2.3.4", 5, window));
        }
        assert!(!limiter.allow("1.2.3.4", 5, window));
    }

    #[test]
    fn distinct_keys_have_independent_windows() {
        let (limiter, _clock) = limiter();
        let window = Duration::from_secs(60);
        for _ in 0..5 {
            assert!(limiter.allow("a", 5, window));
        }
        assert!(limiter.allow("b", 5, window));
    }

    #[test]
    fn expired_entries_free_up_capacity() {
        let (limiter, clock) = limiter();
        let short_window = Duration::from_millis(20);
        assert!(limiter.allow("k", 1, short_window));
        assert!(!limiter.allow("k", 1, short_window));
        clock.advance(ChronoDuration::milliseconds(30));
        assert!(limiter.allow("k", 1, short_window));
    }

    #[test]
    fn sweep_drops_idle_buckets() {
        let (limiter, clock) = limiter();
        limiter.allow("stale", 100, Duration::from_secs(60));
        assert_eq!(limiter.bucket_count(), 1);

        clock.advance(ChronoDuration::minutes(10));

        let removed = limiter.sweep();
        assert_eq!(removed, 1);
        assert_eq!(limiter.bucket_count(), 0);
    }

    #[test]
    fn zero_limit_always_denies() {
        let (limiter, _clock) = limiter();
        assert!(!limiter.allow("x", 0, Duration::from_secs(60)));
    }
}
