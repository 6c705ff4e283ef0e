#![forbid(unsafe_code)]

//! Single-slot debounce for provisional reorders.
//!
//! Hovering a drop zone does not reorder immediately. The decision is parked
//! in an [`AcceptDebouncer`] and only committed once the drag has dwelt for
//! the configured delay without a newer decision replacing it.
//!
//! # Invariants
//!
//! 1. At most one decision is pending. Scheduling always discards the
//!    previous one, which then never fires.
//! 2. A decision that comes due while the [`ScrollSignal`] is raised is
//!    dropped, not deferred.
//! 3. `cancel()` is idempotent.

use web_time::{Duration, Instant};

use crate::collection::Slot;
use crate::scroll_signal::ScrollSignal;
use crate::timer::OneShot;

/// Default dwell before a hover is committed.
pub const DEFAULT_ACCEPT_DELAY: Duration = Duration::from_millis(200);

/// A reorder decision waiting for its dwell to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAccept<K> {
    /// Item being dragged.
    pub moved: K,
    /// Item being hovered.
    pub target: K,
    /// Side of the target to insert on.
    pub slot: Slot,
}

/// What happened when a pending decision came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceOutcome<K> {
    /// The dwell elapsed; commit this decision.
    Fire(PendingAccept<K>),
    /// The dwell elapsed while scrolling; the decision was discarded.
    Suppressed(PendingAccept<K>),
}

/// Holds at most one pending accept and releases it after a dwell.
#[derive(Debug, Clone)]
pub struct AcceptDebouncer<K> {
    timer: OneShot<PendingAccept<K>>,
    delay: Duration,
    scrolling: ScrollSignal,
}

impl<K> AcceptDebouncer<K> {
    /// Create a debouncer reading `scrolling` when decisions come due.
    pub fn new(delay: Duration, scrolling: ScrollSignal) -> Self {
        Self {
            timer: OneShot::new(),
            delay,
            scrolling,
        }
    }

    /// The configured dwell.
    #[inline]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Park `decision`, replacing anything already pending.
    ///
    /// Returns the superseded decision, if any.
    pub fn schedule(&mut self, now: Instant, decision: PendingAccept<K>) -> Option<PendingAccept<K>> {
        self.timer.start(now, self.delay, decision)
    }

    /// Discard the pending decision without firing it.
    pub fn cancel(&mut self) -> Option<PendingAccept<K>> {
        self.timer.cancel()
    }

    /// Whether a decision is pending.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.timer.is_active()
    }

    /// The pending decision.
    pub fn pending(&self) -> Option<&PendingAccept<K>> {
        self.timer.pending()
    }

    /// When the pending decision comes due.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Release the pending decision if its dwell has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<DebounceOutcome<K>> {
        let decision = self.timer.poll(now)?;
        if self.scrolling.is_scrolling() {
            Some(DebounceOutcome::Suppressed(decision))
        } else {
            Some(DebounceOutcome::Fire(decision))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll_signal::ScrollSource;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_150: Duration = Duration::from_millis(150);
    const MS_200: Duration = Duration::from_millis(200);
    const MS_300: Duration = Duration::from_millis(300);

    fn decision(moved: u32, target: u32) -> PendingAccept<u32> {
        PendingAccept {
            moved,
            target,
            slot: Slot::Before,
        }
    }

    #[test]
    fn fires_after_delay() {
        let t = Instant::now();
        let mut d = AcceptDebouncer::new(DEFAULT_ACCEPT_DELAY, ScrollSignal::new());
        d.schedule(t, decision(1, 2));

        assert_eq!(d.poll(t + MS_100), None);
        assert_eq!(d.poll(t + MS_200), Some(DebounceOutcome::Fire(decision(1, 2))));
        assert!(!d.is_pending());
    }

    #[test]
    fn reschedule_supersedes() {
        let t = Instant::now();
        let mut d = AcceptDebouncer::new(DEFAULT_ACCEPT_DELAY, ScrollSignal::new());
        d.schedule(t, decision(1, 2));
        let superseded = d.schedule(t + MS_150, decision(1, 3));
        assert_eq!(superseded, Some(decision(1, 2)));

        // The first deadline passes silently.
        assert_eq!(d.poll(t + MS_200), None);
        assert_eq!(
            d.poll(t + MS_150 + MS_200),
            Some(DebounceOutcome::Fire(decision(1, 3)))
        );
    }

    #[test]
    fn suppressed_while_scrolling() {
        let t = Instant::now();
        let signal = ScrollSignal::new();
        let mut d = AcceptDebouncer::new(DEFAULT_ACCEPT_DELAY, signal.clone());
        signal.raise(ScrollSource::AutoScroll);
        d.schedule(t, decision(1, 2));

        assert_eq!(
            d.poll(t + MS_300),
            Some(DebounceOutcome::Suppressed(decision(1, 2)))
        );
        // Dropped, not requeued.
        signal.lower(ScrollSource::AutoScroll);
        assert_eq!(d.poll(t + MS_300 + MS_300), None);
    }

    #[test]
    fn cancel_prevents_firing() {
        let t = Instant::now();
        let mut d = AcceptDebouncer::new(DEFAULT_ACCEPT_DELAY, ScrollSignal::new());
        d.schedule(t, decision(1, 2));
        assert_eq!(d.cancel(), Some(decision(1, 2)));
        assert_eq!(d.cancel(), None);
        assert_eq!(d.poll(t + MS_300), None);
    }
}
