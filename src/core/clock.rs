//! Wall Clock
//!
//! Match time is wall-clock seconds relative to a start time. The clock is
//! injected so tests can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of wall-clock time in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time in seconds (fractional).
    fn now_secs(&self) -> f64;

    /// Current time in whole milliseconds.
    fn now_millis(&self) -> f64 {
        (self.now_secs() * 1000.0).floor()
    }
}

/// Clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `secs`.
    pub fn new(secs: f64) -> Self {
        Self { bits: AtomicU64::new(secs.to_bits()) }
    }

    /// Set the current reading.
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, secs: f64) {
        self.set(self.now_secs() + secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
