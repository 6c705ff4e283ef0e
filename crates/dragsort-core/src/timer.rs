#![forbid(unsafe_code)]

//! Owned, cancellable timer handles driven by an explicit clock.
//!
//! The engine never sleeps and never reads a wall clock. Callers pass `now`
//! into every operation and poll handles for expiry. A test can therefore
//! advance time by arbitrary offsets from a single `Instant::now()`.
//!
//! # Invariants
//!
//! 1. A handle is either idle or armed with exactly one deadline.
//! 2. Arming an armed handle replaces the previous deadline (the previous
//!    expiry can never be observed).
//! 3. `cancel()` on an idle handle is a no-op.
//! 4. [`Periodic::poll`] yields at most one tick per call, so callers can
//!    interleave deadlines from several handles in chronological order.

use web_time::{Duration, Instant};

/// A one-shot deadline carrying a payload.
///
/// The payload is handed back exactly once, when the deadline passes.
#[derive(Debug, Clone)]
pub struct OneShot<T> {
    armed: Option<(Instant, T)>,
}

impl<T> Default for OneShot<T> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<T> OneShot<T> {
    /// Create an idle handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the handle to fire `delay` after `now`, discarding any pending
    /// payload. Returns the discarded payload, if one was pending.
    pub fn start(&mut self, now: Instant, delay: Duration, payload: T) -> Option<T> {
        self.armed
            .replace((now + delay, payload))
            .map(|(_, previous)| previous)
    }

    /// Disarm the handle. Returns the payload that will now never fire.
    pub fn cancel(&mut self) -> Option<T> {
        self.armed.take().map(|(_, payload)| payload)
    }

    /// Whether a deadline is pending.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.armed.is_some()
    }

    /// When the pending payload is due.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|(due, _)| *due)
    }

    /// The pending payload, without disarming.
    #[must_use]
    pub fn pending(&self) -> Option<&T> {
        self.armed.as_ref().map(|(_, payload)| payload)
    }

    /// Take the payload if its deadline is at or before `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|due| due <= now) {
            self.cancel()
        } else {
            None
        }
    }
}

/// A repeating tick with a fixed period.
///
/// The first tick is due one full period after [`start`](Self::start).
#[derive(Debug, Clone, Default)]
pub struct Periodic {
    next: Option<Instant>,
    period: Duration,
    ticks: u64,
}

impl Periodic {
    /// Create an idle handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period` from `now`, resetting the tick count.
    ///
    /// A zero period is clamped to 1ms so polling always terminates.
    pub fn start(&mut self, now: Instant, period: Duration) {
        self.period = period.max(Duration::from_millis(1));
        self.next = Some(now + self.period);
        self.ticks = 0;
    }

    /// Stop ticking. Idempotent.
    pub fn cancel(&mut self) {
        self.next = None;
    }

    /// Whether the handle is ticking.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.next.is_some()
    }

    /// When the next tick is due.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// The configured period.
    #[inline]
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks delivered since the last `start`.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Consume one due tick. Returns the instant the tick was scheduled for.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        let due = self.next?;
        if due > now {
            return None;
        }
        self.next = Some(due + self.period);
        self.ticks += 1;
        Some(due)
    }
}
