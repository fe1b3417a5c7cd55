use std::time::{Duration, Instant};

/// Default input poll interval in milliseconds
pub const DEFAULT_TICK_MS: u64 = 250;

/// Get poll duration
pub fn tick_duration() -> Duration {
    Duration::from_millis(DEFAULT_TICK_MS)
}

/// Turns a fast poll loop into whole-second engine ticks.
///
/// Time that has passed but not yet made up a full second is carried over,
/// so a slow frame is caught up rather than lost.
#[derive(Debug, Clone, Copy)]
pub struct SecondTicker {
    last: Instant,
}

impl SecondTicker {
    pub fn new(now: Instant) -> Self {
        Self { last: now }
    }

    /// Number of whole seconds elapsed since the last call that returned non-zero
    pub fn due_seconds(&mut self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.last);
        let whole = elapsed.as_secs();
        if whole > 0 {
            self.last += Duration::from_secs(whole);
        }
        whole
    }

    /// Forget any partial second, e.g. when a timer starts
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }
}
