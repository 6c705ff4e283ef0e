#![forbid(unsafe_code)]

//! Last-measured item sizes.
//!
//! The layout collaborator reports sizes as items render; the engine reads
//! them to size drop zones and the drag feedback. Entries for items that
//! left the collection are only dropped by [`SizeRegistry::prune`], which
//! the engine calls on the next collection change. A measurement that
//! arrives for an item between its removal and that prune is harmless.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::geometry::Size;

/// Outcome of a [`SizeRegistry::report`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The entry was stored; some tracked items are still unmeasured.
    Recorded,
    /// This report completed the set of tracked items. Emitted once per
    /// tracked set (reset by [`SizeRegistry::prune`]).
    Ready,
}

/// Maps item ids to their last reported size.
#[derive(Debug, Clone)]
pub struct SizeRegistry<K> {
    sizes: AHashMap<K, Size>,
    tracked: AHashSet<K>,
    ready_emitted: bool,
}

impl<K> Default for SizeRegistry<K> {
    fn default() -> Self {
        Self {
            sizes: AHashMap::default(),
            tracked: AHashSet::default(),
            ready_emitted: false,
        }
    }
}

impl<K: Clone + Eq + Hash> SizeRegistry<K> {
    /// Create an empty registry tracking `current` ids.
    pub fn new(current: impl IntoIterator<Item = K>) -> Self {
        Self {
            tracked: current.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Record `size` for `id`.
    ///
    /// Returns [`ReportOutcome::Ready`] the first time every tracked item has
    /// an entry.
    pub fn report(&mut self, id: K, size: Size) -> ReportOutcome {
        self.sizes.insert(id, size);
        if !self.ready_emitted && self.is_complete() {
            self.ready_emitted = true;
            return ReportOutcome::Ready;
        }
        ReportOutcome::Recorded
    }

    /// Last known size for `id`, or [`Size::ZERO`] if never measured.
    #[must_use]
    pub fn size_of(&self, id: &K) -> Size {
        self.sizes.get(id).copied().unwrap_or(Size::ZERO)
    }

    /// Whether `id` has been measured.
    #[must_use]
    pub fn is_measured(&self, id: &K) -> bool {
        self.sizes.contains_key(id)
    }

    /// Drop entries for ids not in `current` and start tracking `current`.
    ///
    /// Returns how many entries were removed. Re-arms the ready
    /// notification if the new set is not fully measured yet.
    pub fn prune(&mut self, current: impl IntoIterator<Item = K>) -> usize {
        self.tracked = current.into_iter().collect();
        let before = self.sizes.len();
        let tracked = &self.tracked;
        self.sizes.retain(|id, _| tracked.contains(id));
        self.ready_emitted = self.is_complete() && self.ready_emitted;
        before - self.sizes.len()
    }

    /// Whether every tracked id has an entry.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tracked.iter().all(|id| self.sizes.contains_key(id))
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}
