//! Cost-cap counters (spec §5, §6 `MAX_EMBEDDINGS_PER_HOUR`,
//! `MAX_LLM_CALLS_PER_USER_DAY`). A rolling fixed-window counter: each window
//! resets when its wall-clock bucket advances, rather than needing a
//! background timer to clear it.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// Tracks spend against a per-window cap. 0 = unlimited.
pub struct RateBudget {
    limit: u32,
    window_secs: i64,
    window_start_unix: AtomicI64,
    count: AtomicU32,
}

impl RateBudget {
    pub fn per_hour(limit: u32) -> Self {
        Self::new(limit, 3600)
    }

    pub fn per_day(limit: u32) -> Self {
        Self::new(limit, 86_400)
    }

    fn new(limit: u32, window_secs: i64) -> Self {
        Self {
            limit,
            window_secs,
            window_start_unix: AtomicI64::new(0),
            count: AtomicU32::new(0),
        }
    }

    fn roll_window(&self, now_unix: i64) {
        let start = self.window_start_unix.load(Ordering::Relaxed);
        if now_unix - start >= self.window_secs {
            // Best-effort reset; a concurrent racer may reset twice, which
            // only makes the cap momentarily more permissive, never less.
            self.window_start_unix.store(now_unix, Ordering::Relaxed);
            self.count.store(0, Ordering::Relaxed);
        }
    }

    /// True if `n` more calls fit under the cap this window. Unlimited when
    /// `limit == 0`.
    pub fn has_capacity(&self, now_unix: i64, n: u32) -> bool {
        if self.limit == 0 {
            return true;
        }
        self.roll_window(now_unix);
        self.count.load(Ordering::Relaxed) + n <= self.limit
    }

    /// Record `n` calls against the window. Returns false if this pushed the
    /// window over the cap (the spend is still recorded — callers should
    /// check `has_capacity` first and skip the call entirely on `false`).
    pub fn record(&self, now_unix: i64, n: u32) -> bool {
        if self.limit == 0 {
            return true;
        }
        self.roll_window(now_unix);
        let prev = self.count.fetch_add(n, Ordering::Relaxed);
        prev + n <= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_always_has_capacity() {
        let b = RateBudget::per_hour(0);
        assert!(b.has_capacity(0, 1_000_000));
    }

    #[test]
    fn caps_within_window() {
        let b = RateBudget::per_hour(10);
        assert!(b.has_capacity(0, 10));
        assert!(b.record(0, 10));
        assert!(!b.has_capacity(10, 1));
    }

    #[test]
    fn resets_after_window_elapses() {
        let b = RateBudget::per_hour(5);
        assert!(b.record(0, 5));
        assert!(!b.has_capacity(10, 1));
        assert!(b.has_capacity(3601, 1));
    }
}
