#![forbid(unsafe_code)]

//! Invisible insert-before / insert-after targets attached to each item.
//!
//! A [`DropZonePair`] splits an item's measured rectangle in two along the
//! layout axis. The leading half means "insert before this item", the
//! trailing half "insert after". The halves tile the item exactly and never
//! overlap. Before the item is measured both zones are zero-sized, which
//! hosts must tolerate.
//!
//! The pair does not hold a reference to the engine. It turns hover, move,
//! leave and drop callbacks from the host's hit-testing into [`DragEvent`]s
//! with the slot fixed per zone, which the host feeds to
//! [`ReorderEngine::handle`](crate::engine::ReorderEngine::handle).

use crate::collection::Slot;
use crate::config::HitTestBehavior;
use crate::engine::{DragDetails, DragEvent};
use crate::geometry::{Axis, Point, Rect, Size};

/// One half of a [`DropZonePair`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropZone {
    /// Which insertion this zone signals.
    pub slot: Slot,
    /// Region in item-local coordinates.
    pub rect: Rect,
    /// How the host should hit-test the region.
    pub hit_test: HitTestBehavior,
}

/// The two drop zones for one target item.
#[derive(Debug, Clone, PartialEq)]
pub struct DropZonePair<K> {
    target: K,
    before: DropZone,
    after: DropZone,
}

impl<K: Clone> DropZonePair<K> {
    /// Lay out zones over an item of `size`, split along `axis`.
    pub fn new(target: K, size: Size, axis: Axis, hit_test: HitTestBehavior) -> Self {
        let half = size.halved_along(axis);
        let after_origin = match axis {
            Axis::Horizontal => Point::new(half.width, 0.0),
            Axis::Vertical => Point::new(0.0, half.height),
        };
        Self {
            target,
            before: DropZone {
                slot: Slot::Before,
                rect: Rect::new(Point::ZERO, half),
                hit_test,
            },
            after: DropZone {
                slot: Slot::After,
                rect: Rect::new(after_origin, half),
                hit_test,
            },
        }
    }

    /// The item these zones belong to.
    #[inline]
    pub fn target(&self) -> &K {
        &self.target
    }

    /// The insert-before zone.
    #[inline]
    pub fn before(&self) -> &DropZone {
        &self.before
    }

    /// The insert-after zone.
    #[inline]
    pub fn after(&self) -> &DropZone {
        &self.after
    }

    /// Both zones, leading first.
    pub fn zones(&self) -> [&DropZone; 2] {
        [&self.before, &self.after]
    }

    /// Zone under an item-local `point`.
    pub fn hit_test(&self, point: Point) -> Option<Slot> {
        self.zones()
            .into_iter()
            .find(|zone| zone.rect.contains(point))
            .map(|zone| zone.slot)
    }

    /// The drag entered the `slot` zone.
    pub fn enter(&self, slot: Slot) -> DragEvent<K> {
        DragEvent::ZoneEnter {
            target: self.target.clone(),
            slot,
        }
    }

    /// The drag moved within the `slot` zone.
    pub fn moved(&self, slot: Slot, details: DragDetails) -> DragEvent<K> {
        DragEvent::ZoneMove {
            target: self.target.clone(),
            slot,
            details,
        }
    }

    /// The drag left the `slot` zone.
    pub fn leave(&self, slot: Slot) -> DragEvent<K> {
        DragEvent::ZoneLeave {
            target: self.target.clone(),
            slot,
        }
    }

    /// The dragged item was released over the `slot` zone.
    pub fn dropped(&self, slot: Slot) -> DragEvent<K> {
        DragEvent::Drop {
            target: self.target.clone(),
            slot,
        }
    }

    /// Events for the pointer moving from `previous` to `point` in item-local
    /// coordinates: a leave for the zone exited, then an enter or move for the
    /// zone now under the pointer. Returns the slot now hovered.
    pub fn track(
        &self,
        previous: Option<Slot>,
        point: Point,
        details: DragDetails,
        out: &mut Vec<DragEvent<K>>,
    ) -> Option<Slot> {
        let current = self.hit_test(point);
        match (previous, current) {
            (Some(old), Some(new)) if old == new => out.push(self.moved(new, details)),
            (old, new) => {
                if let Some(old) = old {
                    out.push(self.leave(old));
                }
                if let Some(new) = new {
                    out.push(self.enter(new));
                }
            }
        }
        current
    }
}
