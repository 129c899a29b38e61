//! Monotonic time sources. The engine never reads the system clock directly.

use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Copy, Clone, Default, Debug)]
pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time, so a host can keep one
/// handle and give another to the engine.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: std::rc::Rc<std::cell::Cell<Instant>>,
}
impl ManualClock {
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            now: std::rc::Rc::new(std::cell::Cell::new(start)),
        }
    }
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
    /// Jump to `when`. Moving backwards is ignored, this is a monotonic clock.
    pub fn set(&self, when: Instant) {
        if when > self.now.get() {
            self.now.set(when);
        }
    }
}
impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
