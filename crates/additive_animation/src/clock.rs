//! Time sources
//!
//! The controller reads time through the [`Clock`] trait so hosts can supply
//! their own frame timestamps and tests can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic time source in milliseconds
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since an arbitrary fixed origin
    fn now_ms(&self) -> f64;
}

/// Wall-clock time measured with [`Instant`], relative to creation
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give
/// another to a controller.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::Release);
    }

    /// Move forward by `delta_ms`
    pub fn advance(&self, delta_ms: f64) {
        self.set(self.now_ms() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
