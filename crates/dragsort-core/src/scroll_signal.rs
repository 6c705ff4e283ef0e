#![forbid(unsafe_code)]

//! Shared "scroll in progress" flag.
//!
//! The auto-scroll controller raises the signal while its timer runs and the
//! accept debouncer reads it when a pending decision comes due. Both hold a
//! clone of the same [`ScrollSignal`]; nothing is process-global, so two
//! engines on the same thread never suppress each other.
//!
//! The signal tracks each holder separately rather than a single bool:
//! user-driven scroll notifications and the auto-scroll timer may overlap,
//! and lowering one must not clear the other.

use std::cell::Cell;
use std::rc::Rc;

/// Who is holding the signal up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSource {
    /// The engine's own edge auto-scroll timer.
    AutoScroll,
    /// A host scroll notification (user fling, programmatic scroll).
    Notification,
}

#[derive(Debug, Default)]
struct Holders {
    auto_scroll: Cell<bool>,
    notification: Cell<bool>,
}

/// A cloneable handle onto one engine's scroll suppression state.
///
/// Single-threaded by construction (`Rc`), matching the event-loop model.
#[derive(Debug, Clone, Default)]
pub struct ScrollSignal {
    inner: Rc<Holders>,
}

impl ScrollSignal {
    /// Create a lowered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal on behalf of `source`. Idempotent.
    pub fn raise(&self, source: ScrollSource) {
        self.slot(source).set(true);
    }

    /// Lower the signal on behalf of `source`. Idempotent.
    pub fn lower(&self, source: ScrollSource) {
        self.slot(source).set(false);
    }

    /// Whether any source is currently scrolling.
    #[inline]
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.inner.auto_scroll.get() || self.inner.notification.get()
    }

    /// Whether `source` specifically holds the signal.
    #[must_use]
    pub fn is_held_by(&self, source: ScrollSource) -> bool {
        self.slot(source).get()
    }

    fn slot(&self, source: ScrollSource) -> &Cell<bool> {
        match source {
            ScrollSource::AutoScroll => &self.inner.auto_scroll,
            ScrollSource::Notification => &self.inner.notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_lowered() {
        assert!(!ScrollSignal::new().is_scrolling());
    }

    #[test]
    fn clones_share_state() {
        let a = ScrollSignal::new();
        let b = a.clone();
        a.raise(ScrollSource::AutoScroll);
        assert!(b.is_scrolling());
        b.lower(ScrollSource::AutoScroll);
        assert!(!a.is_scrolling());
    }

    #[test]
    fn sources_are_independent() {
        let signal = ScrollSignal::new();
        signal.raise(ScrollSource::AutoScroll);
        signal.raise(ScrollSource::Notification);
        signal.lower(ScrollSource::AutoScroll);
        assert!(signal.is_scrolling());
        assert!(signal.is_held_by(ScrollSource::Notification));
        signal.lower(ScrollSource::Notification);
        assert!(!signal.is_scrolling());
    }

    #[test]
    fn separate_signals_do_not_interfere() {
        let a = ScrollSignal::new();
        let b = ScrollSignal::new();
        a.raise(ScrollSource::AutoScroll);
        assert!(!b.is_scrolling());
    }
}
