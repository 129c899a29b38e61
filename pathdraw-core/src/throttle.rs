//! # Throttle
//!
//! Gates a high-frequency stream of calls down to at most one per interval.
//!
//! There is no timer thread. A throttle holds at most one pending deadline, which the owner polls
//! from its event loop (see [`Throttle::deadline`] and [`Throttle::poll`]). Every method takes the
//! current monotonic time explicitly, so the caller decides what clock drives it.

use std::time::{Duration, Instant};

/// Which edges of a throttle window call through.
#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ThrottleOptions {
    /// The call that opens a window executes immediately.
    pub leading: bool,
    /// The last call suppressed inside a window executes once when it closes.
    pub trailing: bool,
}
impl Default for ThrottleOptions {
    fn default() -> Self {
        Self {
            leading: true,
            trailing: true,
        }
    }
}

struct Pending<T> {
    deadline: Instant,
    args: T,
}

pub struct Throttle<T> {
    interval: Duration,
    options: ThrottleOptions,
    /// When the last window was opened. `None` means "never", so the next call is always on time.
    previous: Option<Instant>,
    pending: Option<Pending<T>>,
}
impl<T> Throttle<T> {
    #[must_use]
    pub fn new(interval: Duration, options: ThrottleOptions) -> Self {
        Self {
            interval,
            options,
            previous: None,
            pending: None,
        }
    }
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
    #[must_use]
    pub fn options(&self) -> ThrottleOptions {
        self.options
    }
    /// Offer a call. Returns the arguments if they should execute right now.
    ///
    /// Suppressed arguments replace any older suppressed arguments, so the trailing call always
    /// carries the most recent ones.
    pub fn call(&mut self, now: Instant, args: T) -> Option<T> {
        // Degenerate, but valid: nothing ever gets through.
        if !self.options.leading && !self.options.trailing {
            return None;
        }
        if self.previous.is_none() && !self.options.leading {
            self.previous = Some(now);
        }
        let remaining = self.remaining(now);
        match remaining {
            // Window elapsed (or the clock went backwards). A trailing call that was due but not
            // yet polled is superseded by this one.
            None => {
                self.pending = None;
                self.previous = Some(now);
                Some(args)
            }
            Some(remaining) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.args = args;
                } else if self.options.trailing {
                    self.pending = Some(Pending {
                        deadline: now + remaining,
                        args,
                    });
                }
                None
            }
        }
    }
    /// Fire the trailing call if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref()?.deadline > now {
            return None;
        }
        let pending = self.pending.take()?;
        self.previous = if self.options.leading {
            Some(now)
        } else {
            None
        };
        Some(pending.args)
    }
    /// The single outstanding timer, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
    /// Drop the pending trailing call without running it. Idempotent.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::trace!("throttle: discarded pending trailing call");
        }
    }
    /// Time left in the open window, or `None` if no window is open.
    fn remaining(&self, now: Instant) -> Option<Duration> {
        let previous = self.previous?;
        // Clock went backwards: treat as elapsed, as the JS-style `remaining > wait` check does.
        let elapsed = now.checked_duration_since(previous)?;
        self.interval
            .checked_sub(elapsed)
            .filter(|remaining| !remaining.is_zero())
    }
}
