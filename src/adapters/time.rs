//! Time source adapters.
//!
//! - [`SystemTimeSource`] — `std::time::Instant`, monotonic, used by the
//!   binary.
//! - [`ManualTime`] — a hand-cranked clock for tests and replay.  Clones
//!   share the same instant, so a test keeps one handle while the
//!   [`SiderealClock`](crate::clock::SiderealClock) owns another.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::app::ports::TimeSource;

/// Wall-clock adapter backed by [`Instant`].
pub struct SystemTimeSource {
    start: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Settable time source.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<f64>>,
}

impl ManualTime {
    /// Starts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }

    pub fn set(&self, secs: f64) {
        self.now.set(secs);
    }

    pub fn get(&self) -> f64 {
        self.now.get()
    }
}

impl TimeSource for ManualTime {
    fn now_secs(&self) -> f64 {
        self.now.get()
    }
}
