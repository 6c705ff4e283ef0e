#![forbid(unsafe_code)]

//! The reorder state machine.
//!
//! [`ReorderEngine`] owns the collection, the current [`DragSession`], the
//! [`AcceptDebouncer`] and the [`AutoScrollController`]. Hosts feed it
//! discrete [`DragEvent`]s through [`handle`](ReorderEngine::handle) and
//! drive its timers with [`poll`](ReorderEngine::poll); nothing inside reads
//! a clock or blocks.
//!
//! # State Machine
//!
//! ```text
//!            DragStart
//!   Idle ─────────────────▶ Dragging ──┐ DragMove / Zone* / Drop
//!    ▲                        │  ▲     │ AnimationPhase / Scroll
//!    │ DragCancel / DragEnd   │  └─────┘
//!    └──── / DragComplete ────┘
//! ```
//!
//! # Invariants
//!
//! 1. Every exit from `Dragging` cancels the pending accept and stops the
//!    auto-scroll timer, so neither fires for a session that has ended.
//! 2. Starting a drag discards any pending accept left from earlier.
//! 3. An auto-scroll tick discards the pending accept (the hovered index is
//!    about to shift). On a deadline tie the tick runs first.
//! 4. A provisional reorder only removes and re-inserts one item; the set of
//!    items never changes.
//! 5. `request_accept(a, a, _)` never does anything.
//!
//! # Failure Modes
//!
//! - Unknown or non-draggable item in `DragStart`: reported as a diagnostic,
//!   the engine stays idle.
//! - No scrollable: reported once, edge auto-scroll is skipped, reordering
//!   continues.
//! - An item removed while a pending accept references it: the accept is
//!   dropped silently when it comes due.

use std::fmt;

use ahash::AHashSet;
use web_time::Instant;

use crate::auto_scroll::{
    AutoScrollController, EdgeAction, ScrollMetrics, Scrollable, TickOutcome,
};
use crate::collection::{Identify, OrderedCollection, Slot};
use crate::config::{DragActivation, HitTestBehavior, ReorderConfig};
use crate::debounce::{AcceptDebouncer, DebounceOutcome, PendingAccept};
use crate::drop_zone::DropZonePair;
use crate::error::{ConfigError, ReorderError};
use crate::geometry::{Axis, Point, Size};
use crate::scroll_signal::{ScrollSignal, ScrollSource};
use crate::size_registry::{ReportOutcome, SizeRegistry};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Pointer details attached to drag updates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragDetails {
    /// Pointer position in viewport coordinates.
    pub position: Point,
    /// Movement since the previous update.
    pub delta: Point,
}

impl DragDetails {
    /// Details at `position` with no movement.
    #[must_use]
    pub const fn at(position: Point) -> Self {
        Self {
            position,
            delta: Point::ZERO,
        }
    }
}

/// Whether a drop-accept animation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationPhase {
    /// Nothing is animating; hovers may reorder and edges may scroll.
    #[default]
    Idle,
    /// The list is mid-transition; hovers and edge checks are ignored.
    Animating,
}

/// Host scroll lifecycle, used when `scroll_notifications` is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollNotification {
    /// The viewport started scrolling.
    Start,
    /// Fresh viewport metrics.
    Update(ScrollMetrics),
    /// The viewport stopped scrolling.
    End,
}

/// One discrete input to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent<K> {
    /// The gesture recognizer picked up `item`.
    DragStart {
        /// Item under the pointer.
        item: K,
    },
    /// The pointer moved while dragging.
    DragMove {
        /// Pointer details.
        details: DragDetails,
    },
    /// The drag entered one of `target`'s drop zones.
    ZoneEnter {
        /// Item owning the zone.
        target: K,
        /// Which zone.
        slot: Slot,
    },
    /// The drag moved inside one of `target`'s drop zones.
    ZoneMove {
        /// Item owning the zone.
        target: K,
        /// Which zone.
        slot: Slot,
        /// Pointer details.
        details: DragDetails,
    },
    /// The drag left one of `target`'s drop zones.
    ZoneLeave {
        /// Item owning the zone.
        target: K,
        /// Which zone.
        slot: Slot,
    },
    /// The dragged item was released over one of `target`'s drop zones.
    Drop {
        /// Item owning the zone.
        target: K,
        /// Which zone.
        slot: Slot,
    },
    /// The drop was not accepted anywhere.
    DragCancel {
        /// Release velocity in pixels per second.
        velocity: Point,
        /// Feedback offset at release.
        offset: Point,
    },
    /// The gesture ended.
    DragEnd {
        /// Pointer details at release.
        details: DragDetails,
    },
    /// A drop target accepted the drag.
    DragComplete,
    /// The host's reorder animation started or finished.
    AnimationPhase(AnimationPhase),
    /// The host's scroll lifecycle changed.
    Scroll(ScrollNotification),
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Callbacks from the engine. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait ReorderObserver<T: Identify> {
    /// A drag session began.
    fn drag_started(&mut self, item: &T::Id) {}

    /// The pointer moved during a drag.
    fn drag_updated(&mut self, item: &T::Id, details: &DragDetails) {}

    /// The drag was released without being accepted.
    fn drag_cancelled(&mut self, item: &T::Id, velocity: Point, offset: Point) {}

    /// The drag gesture ended.
    fn drag_ended(&mut self, item: &T::Id, details: &DragDetails) {}

    /// A drop target accepted the drag.
    fn drag_completed(&mut self, item: &T::Id) {}

    /// Override the accept decision for a hover.
    ///
    /// Returning `Some` takes over: the engine reports the decision and
    /// performs no reorder of its own. `None` (the default) keeps the
    /// debounced provisional reorder.
    fn will_accept(&mut self, moved: &T::Id, target: &T::Id, slot: Slot) -> Option<bool> {
        None
    }

    /// The dragged item was dropped on `target`'s `slot` zone.
    fn accepted(&mut self, moved: &T::Id, target: &T::Id, slot: Slot) {}

    /// The drag left `target`'s `slot` zone.
    fn left(&mut self, moved: &T::Id, target: &T::Id, slot: Slot) {}

    /// The drag moved within `target`'s `slot` zone.
    fn moved(&mut self, target: &T::Id, details: &DragDetails, slot: Slot) {}

    /// A provisional reorder committed; `items` is the full new order.
    fn reordered(&mut self, items: &[T]) {}

    /// Every item in the collection now has a measured size.
    fn sizes_ready(&mut self) {}

    /// A recoverable problem was skipped.
    fn diagnostic(&mut self, error: &ReorderError) {}
}

impl<T: Identify> ReorderObserver<T> for () {}

// ---------------------------------------------------------------------------
// Session and descriptors
// ---------------------------------------------------------------------------

/// State for the one active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession<K> {
    dragged: K,
    phase: AnimationPhase,
    started_at: Instant,
    last_position: Option<Point>,
}

impl<K> DragSession<K> {
    /// The item being dragged.
    #[inline]
    pub fn dragged(&self) -> &K {
        &self.dragged
    }

    /// Current animation phase.
    #[inline]
    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    /// When the drag started.
    #[inline]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Most recent pointer position.
    #[inline]
    pub fn last_position(&self) -> Option<Point> {
        self.last_position
    }
}

/// How the host should build an item's drag handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragHandle {
    /// Press-and-hold versus immediate.
    pub activation: DragActivation,
    /// Axis the feedback is constrained to.
    pub axis: Axis,
    /// Hit-testing mode.
    pub hit_test: HitTestBehavior,
    /// `Some(1)` when multi-item drag is disabled.
    pub max_simultaneous_drags: Option<u32>,
}

/// The floating visual shown under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFeedback {
    /// Last measured size of the dragged item.
    pub size: Size,
    /// Configured opacity.
    pub opacity: f32,
}

/// What [`ReorderEngine::request_accept`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptDecision {
    /// `moved == target`.
    SameItem,
    /// The list is mid-transition.
    Animating,
    /// One of the items is not in the collection.
    Stale,
    /// The observer override decided.
    Delegated(bool),
    /// Parked in the debouncer.
    Scheduled,
}

enum SessionEnd {
    Cancelled { velocity: Point, offset: Point },
    Ended(DragDetails),
    Completed,
    Superseded,
    Vanished,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drag-to-reorder state machine for one collection.
pub struct ReorderEngine<T: Identify, O = (), S = Box<dyn Scrollable>> {
    config: ReorderConfig,
    items: OrderedCollection<T>,
    non_draggable: AHashSet<T::Id>,
    sizes: SizeRegistry<T::Id>,
    signal: ScrollSignal,
    debouncer: AcceptDebouncer<T::Id>,
    auto_scroll: AutoScrollController,
    scrollable: Option<S>,
    notified_metrics: Option<ScrollMetrics>,
    session: Option<DragSession<T::Id>>,
    observer: O,
    no_scrollable_reported: bool,
}

impl<T: Identify, O, S> fmt::Debug for ReorderEngine<T, O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReorderEngine")
            .field("items", &self.items.len())
            .field("dragging", &self.session.as_ref().map(|s| &s.dragged))
            .field("pending_accept", &self.debouncer.is_pending())
            .field("auto_scroll", &self.auto_scroll.direction())
            .field("has_scrollable", &self.scrollable.is_some())
            .finish()
    }
}

impl<T: Identify> ReorderEngine<T> {
    /// Create an idle engine over `items`.
    ///
    /// Fails if `config` does not validate or `items` contains duplicate ids.
    pub fn new(items: Vec<T>, config: ReorderConfig) -> Result<Self, ConfigError> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }
        let items = OrderedCollection::new(items)?;
        let signal = ScrollSignal::new();
        Ok(Self {
            sizes: SizeRegistry::new(items.ids()),
            debouncer: AcceptDebouncer::new(config.accept_delay, signal.clone()),
            auto_scroll: AutoScrollController::new(config.auto_scroll(), signal.clone()),
            signal,
            items,
            non_draggable: AHashSet::default(),
            scrollable: None,
            notified_metrics: None,
            session: None,
            observer: (),
            no_scrollable_reported: false,
            config,
        })
    }
}

impl<T: Identify, O: ReorderObserver<T>, S: Scrollable> ReorderEngine<T, O, S> {
    /// Replace the observer.
    pub fn with_observer<O2: ReorderObserver<T>>(self, observer: O2) -> ReorderEngine<T, O2, S> {
        ReorderEngine {
            config: self.config,
            items: self.items,
            non_draggable: self.non_draggable,
            sizes: self.sizes,
            signal: self.signal,
            debouncer: self.debouncer,
            auto_scroll: self.auto_scroll,
            scrollable: self.scrollable,
            notified_metrics: self.notified_metrics,
            session: self.session,
            observer,
            no_scrollable_reported: self.no_scrollable_reported,
        }
    }

    /// Attach the scrollable that edge auto-scroll drives.
    pub fn with_scrollable<S2: Scrollable>(self, scrollable: S2) -> ReorderEngine<T, O, S2> {
        ReorderEngine {
            config: self.config,
            items: self.items,
            non_draggable: self.non_draggable,
            sizes: self.sizes,
            signal: self.signal,
            debouncer: self.debouncer,
            auto_scroll: self.auto_scroll,
            scrollable: Some(scrollable),
            notified_metrics: self.notified_metrics,
            session: self.session,
            observer: self.observer,
            no_scrollable_reported: false,
        }
    }

    /// Mark items that cannot be dragged. They keep their slot and stay
    /// valid targets for other items.
    #[must_use]
    pub fn with_non_draggable(mut self, ids: impl IntoIterator<Item = T::Id>) -> Self {
        self.non_draggable.extend(ids);
        self
    }

    // -- Accessors ----------------------------------------------------------

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// Items in their current order.
    #[inline]
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Give back the items in their current order.
    pub fn into_items(self) -> Vec<T> {
        self.items.into_vec()
    }

    /// The observer.
    #[inline]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The observer, mutably.
    #[inline]
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// The attached scrollable.
    #[inline]
    pub fn scrollable(&self) -> Option<&S> {
        self.scrollable.as_ref()
    }

    /// The attached scrollable, mutably.
    #[inline]
    pub fn scrollable_mut(&mut self) -> Option<&mut S> {
        self.scrollable.as_mut()
    }

    /// The active drag, if any.
    #[inline]
    pub fn session(&self) -> Option<&DragSession<T::Id>> {
        self.session.as_ref()
    }

    /// Whether a drag is active.
    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The accept waiting for its dwell.
    pub fn pending_accept(&self) -> Option<&PendingAccept<T::Id>> {
        self.debouncer.pending()
    }

    /// Whether the edge auto-scroll timer is running.
    #[inline]
    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.is_active()
    }

    /// Whether reorders are currently suppressed by scrolling.
    #[inline]
    pub fn is_scroll_suppressed(&self) -> bool {
        self.signal.is_scrolling()
    }

    /// Earliest pending timer deadline. Poll no later than this.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debouncer.deadline(), self.auto_scroll.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Whether `id` may be dragged.
    pub fn is_draggable(&self, id: &T::Id) -> bool {
        self.items.contains(id) && !self.non_draggable.contains(id)
    }

    // -- Sizes and descriptors ---------------------------------------------

    /// Record a measured size for `id`.
    pub fn report_size(&mut self, id: T::Id, size: Size) {
        if self.sizes.report(id, size) == ReportOutcome::Ready {
            tracing::debug!(items = self.items.len(), "all item sizes measured");
            self.observer.sizes_ready();
        }
    }

    /// Last measured size for `id`, or zero.
    pub fn size_of(&self, id: &T::Id) -> Size {
        self.sizes.size_of(id)
    }

    /// Drag handle settings for `id`, or `None` if it cannot be dragged.
    pub fn draggable(&self, id: &T::Id) -> Option<DragHandle> {
        self.is_draggable(id).then(|| DragHandle {
            activation: self.config.activation,
            axis: self.config.layout_axis,
            hit_test: self.config.hit_test,
            max_simultaneous_drags: self.config.max_simultaneous_drags(),
        })
    }

    /// Feedback visual for dragging `id`.
    pub fn feedback(&self, id: &T::Id) -> Option<DragFeedback> {
        self.is_draggable(id).then(|| DragFeedback {
            size: self.sizes.size_of(id),
            opacity: self.config.feedback_opacity,
        })
    }

    /// Drop zones to attach to `id`, sized from its last measurement.
    pub fn drop_zones(&self, id: &T::Id) -> Option<DropZonePair<T::Id>> {
        self.is_draggable(id).then(|| {
            DropZonePair::new(
                id.clone(),
                self.sizes.size_of(id),
                self.config.layout_axis,
                self.config.hit_test,
            )
        })
    }

    // -- Collection changes -------------------------------------------------

    /// Replace the collection after an external change.
    ///
    /// Prunes sizes for departed items. A pending accept or drag that
    /// references a departed item is dropped without callbacks.
    pub fn set_items(&mut self, items: Vec<T>) -> Result<(), ReorderError> {
        self.items = OrderedCollection::new(items)?;
        let pruned = self.sizes.prune(self.items.ids());
        tracing::debug!(items = self.items.len(), pruned, "collection replaced");

        if let Some(pending) = self.debouncer.pending()
            && !(self.items.contains(&pending.moved) && self.items.contains(&pending.target))
        {
            self.debouncer.cancel();
            tracing::trace!("pending accept dropped: item left the collection");
        }
        if self
            .session
            .as_ref()
            .is_some_and(|s| !self.items.contains(&s.dragged))
        {
            self.end_session(SessionEnd::Vanished);
        }
        Ok(())
    }

    // -- Event ingestion ----------------------------------------------------

    /// Process one event at time `now`.
    pub fn handle(&mut self, event: DragEvent<T::Id>, now: Instant) {
        match event {
            DragEvent::DragStart { item } => self.start_drag(item, now),
            DragEvent::DragMove { details } => self.drag_move(details, now),
            DragEvent::ZoneEnter { target, slot } => {
                if let Some(moved) = self.dragged() {
                    self.request_accept(&moved, &target, slot, now);
                }
            }
            DragEvent::ZoneMove {
                target,
                slot,
                details,
            } => {
                if self.session.is_some() {
                    self.observer.moved(&target, &details, slot);
                }
            }
            DragEvent::ZoneLeave { target, slot } => {
                if let Some(moved) = self.dragged() {
                    self.observer.left(&moved, &target, slot);
                }
            }
            DragEvent::Drop { target, slot } => {
                if let Some(moved) = self.dragged() {
                    tracing::debug!(?moved, ?target, ?slot, "dropped on zone");
                    self.observer.accepted(&moved, &target, slot);
                }
            }
            DragEvent::DragCancel { velocity, offset } => {
                self.end_session(SessionEnd::Cancelled { velocity, offset });
            }
            DragEvent::DragEnd { details } => self.end_session(SessionEnd::Ended(details)),
            DragEvent::DragComplete => self.end_session(SessionEnd::Completed),
            DragEvent::AnimationPhase(phase) => {
                if let Some(session) = self.session.as_mut() {
                    tracing::trace!(?phase, "animation phase");
                    session.phase = phase;
                }
            }
            DragEvent::Scroll(notification) => self.scroll_notification(notification),
        }
    }

    /// Ask for `moved` to be placed on `target`'s `slot` side.
    ///
    /// With an observer override the observer decides and nothing moves.
    /// Otherwise the move is parked in the debouncer, replacing any earlier
    /// pending move, and commits on a later [`poll`](Self::poll).
    pub fn request_accept(
        &mut self,
        moved: &T::Id,
        target: &T::Id,
        slot: Slot,
        now: Instant,
    ) -> AcceptDecision {
        if moved == target {
            return AcceptDecision::SameItem;
        }
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.phase == AnimationPhase::Animating)
        {
            tracing::trace!(?moved, ?target, "accept ignored: list is animating");
            return AcceptDecision::Animating;
        }
        if !(self.items.contains(moved) && self.items.contains(target)) {
            tracing::trace!(?moved, ?target, "accept ignored: stale item");
            return AcceptDecision::Stale;
        }
        if let Some(accept) = self.observer.will_accept(moved, target, slot) {
            return AcceptDecision::Delegated(accept);
        }

        let superseded = self.debouncer.schedule(
            now,
            PendingAccept {
                moved: moved.clone(),
                target: target.clone(),
                slot,
            },
        );
        tracing::trace!(?moved, ?target, ?slot, superseded = superseded.is_some(), "accept scheduled");
        AcceptDecision::Scheduled
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn poll(&mut self, now: Instant) {
        let _span = tracing::trace_span!("reorder.poll", items = self.items.len()).entered();
        loop {
            let accept_due = self.debouncer.deadline().filter(|due| *due <= now);
            let tick_due = self.auto_scroll.deadline().filter(|due| *due <= now);
            match (accept_due, tick_due) {
                (None, None) => break,
                (Some(accept), Some(tick)) if accept < tick => self.fire_accept(now),
                (Some(_), None) => self.fire_accept(now),
                (_, Some(_)) => self.fire_tick(now),
            }
        }
    }

    // -- Internals ----------------------------------------------------------

    fn dragged(&self) -> Option<T::Id> {
        self.session.as_ref().map(|s| s.dragged.clone())
    }

    fn report(&mut self, error: ReorderError) {
        tracing::warn!(kind = error.kind(), %error, "reorder diagnostic");
        self.observer.diagnostic(&error);
    }

    fn start_drag(&mut self, item: T::Id, now: Instant) {
        if !self.items.contains(&item) {
            self.report(ReorderError::unknown_item(&item));
            return;
        }
        if self.non_draggable.contains(&item) {
            self.report(ReorderError::not_draggable(&item));
            return;
        }
        if let Some(active) = self.dragged() {
            if self.config.disable_multi_drag {
                self.report(ReorderError::DragAlreadyActive {
                    active: format!("{active:?}"),
                    requested: format!("{item:?}"),
                });
                return;
            }
            self.end_session(SessionEnd::Superseded);
        }

        self.debouncer.cancel();
        tracing::debug!(?item, "drag started");
        self.session = Some(DragSession {
            dragged: item.clone(),
            phase: AnimationPhase::Idle,
            started_at: now,
            last_position: None,
        });
        self.observer.drag_started(&item);
    }

    fn drag_move(&mut self, details: DragDetails, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            tracing::trace!("drag move ignored: no active drag");
            return;
        };
        session.last_position = Some(details.position);
        let phase = session.phase;
        let item = session.dragged.clone();
        self.observer.drag_updated(&item, &details);

        if phase != AnimationPhase::Idle {
            return;
        }
        if self.scrollable.is_none() {
            self.report_no_scrollable();
            return;
        }
        let Some(metrics) = self.metrics() else {
            return;
        };
        let position = self.config.scroll_axis.main_of(details.position);
        if let EdgeAction::Started(direction) = self.auto_scroll.update(position, &metrics, now) {
            tracing::trace!(?item, ?direction, "drag entered edge margin");
        }
    }

    fn end_session(&mut self, reason: SessionEnd) {
        let pending = self.debouncer.cancel();
        let scrolled = self.auto_scroll.stop();
        let Some(session) = self.session.take() else {
            tracing::trace!("end ignored: no active drag");
            return;
        };
        tracing::debug!(
            item = ?session.dragged,
            dropped_pending = pending.is_some(),
            stopped_scroll = scrolled,
            "drag session ended"
        );

        let item = &session.dragged;
        match reason {
            SessionEnd::Cancelled { velocity, offset } => {
                self.observer.drag_cancelled(item, velocity, offset);
            }
            SessionEnd::Ended(details) => self.observer.drag_ended(item, &details),
            SessionEnd::Completed => self.observer.drag_completed(item),
            SessionEnd::Superseded => {
                self.observer.drag_cancelled(item, Point::ZERO, Point::ZERO);
            }
            SessionEnd::Vanished => {}
        }
    }

    fn fire_accept(&mut self, now: Instant) {
        match self.debouncer.poll(now) {
            Some(DebounceOutcome::Fire(accept)) => {
                if !(self.items.contains(&accept.moved) && self.items.contains(&accept.target)) {
                    tracing::trace!(?accept, "accept dropped: stale item");
                    return;
                }
                if self
                    .items
                    .move_relative(&accept.moved, &accept.target, accept.slot)
                {
                    tracing::debug!(
                        moved = ?accept.moved,
                        target = ?accept.target,
                        slot = ?accept.slot,
                        "provisional reorder committed"
                    );
                    self.observer.reordered(self.items.as_slice());
                }
            }
            Some(DebounceOutcome::Suppressed(accept)) => {
                tracing::debug!(?accept, "accept dropped: scroll in progress");
            }
            None => {}
        }
    }

    fn fire_tick(&mut self, now: Instant) {
        let Some(metrics) = self.metrics() else {
            self.auto_scroll.stop();
            return;
        };
        let Some(TickOutcome::Scroll {
            target,
            duration,
            easing,
            ..
        }) = self.auto_scroll.poll(now, &metrics)
        else {
            return;
        };

        if let Some(stale) = self.debouncer.cancel() {
            tracing::trace!(?stale, "pending accept invalidated by scroll");
        }
        if let Some(scrollable) = self.scrollable.as_mut() {
            scrollable.animate_to(target, duration, easing);
        }
        // The notification cache tracks our own animation.
        if self.config.scroll_notifications
            && let Some(cached) = self.notified_metrics.as_mut()
        {
            cached.offset = target;
        }
    }

    fn metrics(&self) -> Option<ScrollMetrics> {
        let queried = self.scrollable.as_ref().map(Scrollable::metrics);
        if self.config.scroll_notifications {
            self.notified_metrics.or(queried)
        } else {
            queried
        }
    }

    fn report_no_scrollable(&mut self) {
        if !self.no_scrollable_reported {
            self.no_scrollable_reported = true;
            self.report(ReorderError::NoScrollable);
        }
    }

    fn scroll_notification(&mut self, notification: ScrollNotification) {
        if !self.config.scroll_notifications {
            tracing::trace!("scroll notification ignored: notifications disabled");
            return;
        }
        match notification {
            ScrollNotification::Start => self.signal.raise(ScrollSource::Notification),
            ScrollNotification::Update(metrics) => self.notified_metrics = Some(metrics),
            ScrollNotification::End => self.signal.lower(ScrollSource::Notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use web_time::Duration;

    use crate::auto_scroll::Easing;

    const MS_50: Duration = Duration::from_millis(50);
    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);
    const MS_250: Duration = Duration::from_millis(250);

    #[derive(Debug, Default)]
    struct Recorder {
        log: Vec<String>,
        diagnostics: Vec<ReorderError>,
        orders: Vec<Vec<&'static str>>,
        updates: Vec<(&'static str, Point)>,
        zone_moves: Vec<(&'static str, Slot, Point)>,
        override_accept: Option<bool>,
    }

    impl ReorderObserver<&'static str> for Recorder {
        fn drag_started(&mut self, item: &&'static str) {
            self.log.push(format!("started {item}"));
        }
        fn drag_updated(&mut self, item: &&'static str, details: &DragDetails) {
            self.updates.push((*item, details.position));
        }
        fn drag_cancelled(&mut self, item: &&'static str, _velocity: Point, _offset: Point) {
            self.log.push(format!("cancelled {item}"));
        }
        fn drag_ended(&mut self, item: &&'static str, _details: &DragDetails) {
            self.log.push(format!("ended {item}"));
        }
        fn drag_completed(&mut self, item: &&'static str) {
            self.log.push(format!("completed {item}"));
        }
        fn will_accept(&mut self, moved: &&'static str, target: &&'static str, slot: Slot) -> Option<bool> {
            if self.override_accept.is_some() {
                self.log.push(format!("will_accept {moved} {target} {slot:?}"));
            }
            self.override_accept
        }
        fn accepted(&mut self, moved: &&'static str, target: &&'static str, slot: Slot) {
            self.log.push(format!("accepted {moved} {target} {slot:?}"));
        }
        fn left(&mut self, moved: &&'static str, target: &&'static str, slot: Slot) {
            self.log.push(format!("left {moved} {target} {slot:?}"));
        }
        fn moved(&mut self, target: &&'static str, details: &DragDetails, slot: Slot) {
            self.zone_moves.push((*target, slot, details.position));
        }
        fn reordered(&mut self, items: &[&'static str]) {
            self.orders.push(items.to_vec());
        }
        fn sizes_ready(&mut self) {
            self.log.push("ready".to_string());
        }
        fn diagnostic(&mut self, error: &ReorderError) {
            self.diagnostics.push(error.clone());
        }
    }

    #[derive(Debug, Clone, Default)]
    struct FakeScroll {
        state: Rc<RefCell<(ScrollMetrics, Vec<(f32, Duration, Easing)>)>>,
    }

    impl FakeScroll {
        fn new(offset: f32) -> Self {
            let metrics = ScrollMetrics {
                offset,
                min_scroll_extent: 0.0,
                max_scroll_extent: 500.0,
                viewport_start: 0.0,
                viewport_extent: 100.0,
            };
            Self {
                state: Rc::new(RefCell::new((metrics, Vec::new()))),
            }
        }

        fn offset(&self) -> f32 {
            self.state.borrow().0.offset
        }

        fn calls(&self) -> usize {
            self.state.borrow().1.len()
        }
    }

    impl Scrollable for FakeScroll {
        fn metrics(&self) -> ScrollMetrics {
            self.state.borrow().0
        }

        fn animate_to(&mut self, offset: f32, duration: Duration, easing: Easing) {
            let mut state = self.state.borrow_mut();
            state.0.offset = offset;
            state.1.push((offset, duration, easing));
        }
    }

    fn engine() -> ReorderEngine<&'static str, Recorder, FakeScroll> {
        ReorderEngine::new(vec!["A", "B", "C"], ReorderConfig::default())
            .unwrap()
            .with_observer(Recorder::default())
            .with_scrollable(FakeScroll::new(0.0))
    }

    fn start(e: &mut ReorderEngine<&'static str, Recorder, FakeScroll>, item: &'static str, t: Instant) {
        e.handle(DragEvent::DragStart { item }, t);
    }

    fn hover(
        e: &mut ReorderEngine<&'static str, Recorder, FakeScroll>,
        target: &'static str,
        slot: Slot,
        t: Instant,
    ) {
        e.handle(DragEvent::ZoneEnter { target, slot }, t);
    }

    fn move_to(e: &mut ReorderEngine<&'static str, Recorder, FakeScroll>, y: f32, t: Instant) {
        e.handle(
            DragEvent::DragMove {
                details: DragDetails::at(Point::new(10.0, y)),
            },
            t,
        );
    }

    #[test]
    fn hover_reorders_after_dwell() {
        let t = Instant::now();
        let mut e = engine();
        start(&mut e, "A", t);
        hover(&mut e, "C", Slot::Before, t);

        e.poll(t + MS_100);
        assert_eq!(e.items(), &["A", "B", "C"]);
        e.poll(t + MS_200);
        assert_eq!(e.items(), &["B", "A", "C"]);
        assert_eq!(e.observer().orders, vec![vec!["B", "A", "C"]]);
    }

    #[test]
    fn insert_after_last_is_clamped() {
        let t = Instant::now();
        let mut e = engine();
        start(&mut e, "A", t);
        hover(&mut e, "C", Slot::After, t);
        e.poll(t + MS_200);
        assert_eq!(e.items(), &["B", "A", "C"]);
    }

    #[test]
    fn self_accept_is_noop() {
        let t = Instant::now();
        let mut e = engine();
        assert_eq!(e.request_accept(&"A", &"A", Slot::Before, t), AcceptDecision::SameItem);
        start(&mut e, "A", t);
        assert_eq!(e.request_accept(&"A", &"A", Slot::After, t), AcceptDecision::SameItem);
        assert!(e.pending_accept().is_none());
    }

    #[test]
    fn newer_hover_supersedes_pending() {
        let t = Instant::now();
        let mut e = engine();
        start(&mut e, "A", t);
        hover(&mut e, "B", Slot::After, t);
        hover(&mut e, "C", Slot::After, t + MS_100);

        e.poll(t + MS_200);
        assert_eq!(e.items(), &["A", "B", "C"]);
        e.poll(t + MS_100 + MS_200);
        assert_eq!(e.items(), &["B", "A", "C"]);
        assert_eq!(e.observer().orders.len(), 1);
    }

    #[test]
    fn animating_phase_ignores_hover() {
        let t = Instant::now();
        let mut e = engine();
        start(&mut e, "A", t);
        e.handle(DragEvent::AnimationPhase(AnimationPhase::Animating), t);
        assert_eq!(e.request_accept(&"A", &"C", Slot::Before, t), AcceptDecision::Animating);
        e.handle(DragEvent::AnimationPhase(AnimationPhase::Idle), t);
        assert_eq!(e.request_accept(&"A", &"C", Slot::Before, t), AcceptDecision::Scheduled);
    }

    #[test]
    fn override_delegates_without_mutation() {
        let t = Instant::now();
        let mut e = engine();
        e.observer_mut().override_accept = Some(true);
        start(&mut e, "A", t);
        hover(&mut e, "C", Slot::Before, t);
        e.poll(t + MS_250);

        assert_eq!(e.items(), &["A", "B", "C"]);
        assert!(e.observer().log.contains(&"will_accept A C Before".to_string()));
    }

    #[test]
    fn drop_reports_accepted_with_slot() {
        let t = Instant::now();
        let mut e = engine();
        start(&mut e, "B", t);
        e.handle(
            DragEvent::Drop {
                target: "A",
                slot: Slot::After,
            },
            t,
        );
        e.handle(DragEvent::DragComplete, t);
        assert_eq!(
            e.observer().log,
            vec!["started B", "accepted B A After", "completed B"]
        );
        assert!(!e.is_dragging());
    }

    #[test]
    fn every_end_path_cleans_up() {
        let ends = [
            DragEvent::DragCancel {
                velocity: Point::ZERO,
                offset: Point::ZERO,
            },
            DragEvent::DragEnd {
                details: DragDetails::default(),
            },
            DragEvent::DragComplete,
        ];
        for end in ends {
            let t = Instant::now();
            let mut e = engine();
            e.scrollable_mut().unwrap().state.borrow_mut().0.offset = 200.0;
            start(&mut e, "A", t);
            move_to(&mut e, 95.0, t);
            hover(&mut e, "C", Slot::Before, t);
            assert!(e.is_auto_scrolling());
            assert!(e.pending_accept().is_some());

            e.handle(end.clone(), t + MS_50);
            assert!(!e.is_auto_scrolling());
            assert!(e.pending_accept().is_none());
            assert!(!e.is_scroll_suppressed());
            assert_eq!(e.next_deadline(), None);

            // Ending twice is harmless.
            e.handle(end, t + MS_50);
            e.poll(t + MS_250 * 4);
            assert_eq!(e.items(), &["A", "B", "C"]);
            assert_eq!(e.scrollable().unwrap().calls(), 0);
        }
    }

    #[test]
    fn start_clears_stale_pending() {
        let t = Instant::now();
        let mut e = engine();
        assert_eq!(e.request_accept(&"A", &"C", Slot::Before, t), AcceptDecision::Scheduled);
        start(&mut e, "B", t);
        assert!(e.pending_accept().is_none());
    }

    #[test]
    fn non_draggable_cannot_start_but_is_target() {
        let t = Instant::now();
        let mut e = engine().with_non_draggable(["C"]);
        start(&mut e, "C", t);
        assert!(!e.is_dragging());
        assert_eq!(e.observer().diagnostics, vec![ReorderError::not_draggable(&"C")]);
        assert!(e.drop_zones(&"C").is_none());
        assert!(e.draggable(&"C").is_none());

        start(&mut e, "A", t);
        hover(&mut e, "C", Slot::Before, t);
        e.poll(t + MS_200);
        assert_eq!(e.items(), &["B", "A", "C"]);
    }

    #[test]
    fn unknown_item_is_reported() {
        let t = Instant::now();
        let mut e = engine();
        start(&mut e, "Z", t);
        assert!(!e.is_dragging());
        assert_eq!(e.observer().diagnostics, vec![ReorderError::unknown_item(&"Z")]);
    }

    #[test]
    fn second_drag_rejected_when_multi_drag_disabled() {
        let t = Instant::now();
        let mut e = engine();
        start(&mut e, "A", t);
        start(&mut e, "B", t);
        assert_eq!(e.session().unwrap().dragged(), &"A");
        assert!(matches!(
            e.observer().diagnostics[0],
            ReorderError::DragAlreadyActive { .. }
        ));
    }

    #[test]
    fn second_drag_supersedes_when_multi_drag_allowed() {
        let t = Instant::now();
        let config = ReorderConfig {
            disable_multi_drag: false,
            ..ReorderConfig::default()
        };
        let mut e = ReorderEngine::new(vec!["A", "B", "C"], config)
            .unwrap()
            .with_observer(Recorder::default());
        e.handle(DragEvent::DragStart { item: "A" }, t);
        e.handle(DragEvent::DragStart { item: "B" }, t);
        assert_eq!(e.session().unwrap().dragged(), &"B");
        assert_eq!(e.observer().log, vec!["started A", "cancelled A", "started B"]);
    }

    #[test]
    fn edge_scroll_ticks_and_cancels_pending() {
        let t = Instant::now();
        let mut e = engine();
        e.scrollable_mut().unwrap().state.borrow_mut().0.offset = 200.0;
        start(&mut e, "A", t);
        move_to(&mut e, 95.0, t);
        assert!(e.is_scroll_suppressed());

        hover(&mut e, "C", Slot::Before, t + MS_50);
        e.poll(t + MS_100);
        assert_eq!(e.scrollable().unwrap().offset(), 210.0);
        assert!(e.pending_accept().is_none());
        assert_eq!(e.items(), &["A", "B", "C"]);

        let calls = e.scrollable().unwrap().state.borrow().1.clone();
        assert_eq!(calls, vec![(210.0, MS_100, Easing::Linear)]);
    }

    #[test]
    fn accept_while_scrolling_is_dropped() {
        let t = Instant::now();
        let mut e = engine();
        e.scrollable_mut().unwrap().state.borrow_mut().0.offset = 495.0;
        start(&mut e, "A", t);
        // First tick lands after the dwell, so the accept comes due while
        // the signal is raised rather than being cancelled by a tick.
        hover(&mut e, "C", Slot::Before, t);
        move_to(&mut e, 95.0, t + MS_100 + MS_50);
        assert_eq!(e.next_deadline(), Some(t + MS_200));
        e.poll(t + MS_200);
        assert!(e.pending_accept().is_none());
        assert_eq!(e.items(), &["A", "B", "C"]);
    }

    #[test]
    fn scroll_stops_at_extreme() {
        let t = Instant::now();
        let mut e = engine();
        e.scrollable_mut().unwrap().state.borrow_mut().0.offset = 485.0;
        start(&mut e, "A", t);
        move_to(&mut e, 95.0, t);
        e.poll(t + MS_100);
        assert_eq!(e.scrollable().unwrap().offset(), 495.0);
        e.poll(t + MS_200);
        assert_eq!(e.scrollable().unwrap().offset(), 500.0);
        e.poll(t + MS_200 + MS_100);
        assert!(!e.is_auto_scrolling());
        assert!(!e.is_scroll_suppressed());
    }

    #[test]
    fn animating_phase_skips_edge_evaluation() {
        let t = Instant::now();
        let mut e = engine();
        e.scrollable_mut().unwrap().state.borrow_mut().0.offset = 200.0;
        start(&mut e, "A", t);
        e.handle(DragEvent::AnimationPhase(AnimationPhase::Animating), t);
        move_to(&mut e, 95.0, t);
        assert!(!e.is_auto_scrolling());
    }

    #[test]
    fn notified_metrics_do_not_replace_scrollable() {
        let t = Instant::now();
        let config = ReorderConfig {
            scroll_notifications: true,
            ..ReorderConfig::default()
        };
        let mut e = ReorderEngine::new(vec!["A", "B", "C"], config)
            .unwrap()
            .with_observer(Recorder::default());
        let metrics = ScrollMetrics {
            offset: 100.0,
            max_scroll_extent: 500.0,
            viewport_extent: 100.0,
            ..ScrollMetrics::default()
        };
        e.handle(DragEvent::Scroll(ScrollNotification::Update(metrics)), t);
        e.handle(DragEvent::DragStart { item: "A" }, t);
        e.handle(
            DragEvent::DragMove {
                details: DragDetails::at(Point::new(0.0, 95.0)),
            },
            t,
        );
        assert!(!e.is_auto_scrolling());
        assert_eq!(e.observer().diagnostics, vec![ReorderError::NoScrollable]);
        assert!(
            ReorderError::NoScrollable
                .to_string()
                .contains("no scrollable is attached")
        );
    }

    #[test]
    fn missing_scrollable_reported_once() {
        let t = Instant::now();
        let mut e = ReorderEngine::new(vec!["A", "B", "C"], ReorderConfig::default())
            .unwrap()
            .with_observer(Recorder::default());
        e.handle(DragEvent::DragStart { item: "A" }, t);
        for y in [5.0, 6.0, 95.0] {
            e.handle(
                DragEvent::DragMove {
                    details: DragDetails::at(Point::new(0.0, y)),
                },
                t,
            );
        }
        assert_eq!(e.observer().diagnostics, vec![ReorderError::NoScrollable]);

        // Reordering still works.
        e.handle(
            DragEvent::ZoneEnter {
                target: "C",
                slot: Slot::Before,
            },
            t,
        );
        e.poll(t + MS_200);
        assert_eq!(e.items(), &["B", "A", "C"]);
    }

    #[test]
    fn set_items_prunes_and_drops_stale_pending() {
        let t = Instant::now();
        let mut e = engine();
        e.report_size("A", Size::new(10.0, 10.0));
        e.report_size("C", Size::new(10.0, 10.0));
        start(&mut e, "A", t);
        hover(&mut e, "C", Slot::Before, t);

        e.set_items(vec!["A", "B"]).unwrap();
        assert!(e.pending_accept().is_none());
        assert_eq!(e.size_of(&"C"), Size::ZERO);
        assert_eq!(e.size_of(&"A"), Size::new(10.0, 10.0));
        assert!(e.is_dragging());

        e.set_items(vec!["B"]).unwrap();
        assert!(!e.is_dragging());
    }

    #[test]
    fn set_items_rejects_duplicates() {
        let mut e = engine();
        assert!(e.set_items(vec!["A", "A"]).is_err());
        assert_eq!(e.items(), &["A", "B", "C"]);
    }

    #[test]
    fn sizes_ready_once_all_measured() {
        let mut e = engine();
        e.report_size("A", Size::new(1.0, 1.0));
        e.report_size("B", Size::new(1.0, 1.0));
        assert!(e.observer().log.is_empty());
        e.report_size("C", Size::new(1.0, 1.0));
        assert_eq!(e.observer().log, vec!["ready"]);
    }

    #[test]
    fn descriptors_use_measured_size() {
        let mut e = engine();
        e.report_size("A", Size::new(80.0, 40.0));
        let zones = e.drop_zones(&"A").unwrap();
        assert_eq!(zones.before().rect.size, Size::new(80.0, 20.0));
        let feedback = e.feedback(&"A").unwrap();
        assert_eq!(feedback.size, Size::new(80.0, 40.0));
        assert_eq!(feedback.opacity, 0.8);
        assert_eq!(e.draggable(&"A").unwrap().max_simultaneous_drags, Some(1));
        assert_eq!(e.drop_zones(&"B").unwrap().after().rect.size, Size::ZERO);
    }

    #[test]
    fn scroll_notifications_suppress_accepts() {
        let t = Instant::now();
        let config = ReorderConfig {
            scroll_notifications: true,
            ..ReorderConfig::default()
        };
        let mut e = ReorderEngine::new(vec!["A", "B", "C"], config)
            .unwrap()
            .with_observer(Recorder::default())
            .with_scrollable(FakeScroll::new(0.0));
        e.handle(DragEvent::DragStart { item: "A" }, t);
        e.handle(DragEvent::Scroll(ScrollNotification::Start), t);
        e.handle(
            DragEvent::ZoneEnter {
                target: "C",
                slot: Slot::Before,
            },
            t,
        );
        e.poll(t + MS_200);
        assert_eq!(e.items(), &["A", "B", "C"]);

        e.handle(DragEvent::Scroll(ScrollNotification::End), t + MS_200);
        assert!(!e.is_scroll_suppressed());
    }

    #[test]
    fn notified_metrics_drive_edge_detection() {
        let t = Instant::now();
        let config = ReorderConfig {
            scroll_notifications: true,
            ..ReorderConfig::default()
        };
        let mut e = ReorderEngine::new(vec!["A", "B", "C"], config)
            .unwrap()
            .with_observer(Recorder::default())
            .with_scrollable(FakeScroll::new(0.0));
        let metrics = ScrollMetrics {
            offset: 100.0,
            min_scroll_extent: 0.0,
            max_scroll_extent: 500.0,
            viewport_start: 0.0,
            viewport_extent: 100.0,
        };
        e.handle(DragEvent::Scroll(ScrollNotification::Update(metrics)), t);
        e.handle(DragEvent::DragStart { item: "A" }, t);
        e.handle(
            DragEvent::DragMove {
                details: DragDetails::at(Point::new(0.0, 5.0)),
            },
            t,
        );
        // The scrollable itself sits at 0, but notifications say 100.
        assert!(e.is_auto_scrolling());
    }

    #[test]
    fn zone_leave_and_move_need_session() {
        let t = Instant::now();
        let mut e = engine();
        e.handle(
            DragEvent::ZoneLeave {
                target: "B",
                slot: Slot::Before,
            },
            t,
        );
        assert!(e.observer().log.is_empty());
        start(&mut e, "A", t);
        e.handle(
            DragEvent::ZoneLeave {
                target: "B",
                slot: Slot::Before,
            },
            t,
        );
        assert_eq!(e.observer().log, vec!["started A", "left A B Before"]);

        let zone_move = DragEvent::ZoneMove {
            target: "C",
            slot: Slot::After,
            details: DragDetails::at(Point::new(3.0, 4.0)),
        };
        e.handle(zone_move.clone(), t);
        assert_eq!(
            e.observer().zone_moves,
            vec![("C", Slot::After, Point::new(3.0, 4.0))]
        );
        e.handle(DragEvent::DragComplete, t);
        e.handle(zone_move, t);
        assert_eq!(e.observer().zone_moves.len(), 1);
    }

    #[test]
    fn drag_move_reports_position() {
        let t = Instant::now();
        let mut e = engine();
        move_to(&mut e, 40.0, t);
        assert!(e.observer().updates.is_empty());

        start(&mut e, "B", t);
        move_to(&mut e, 40.0, t);
        assert_eq!(e.observer().updates, vec![("B", Point::new(10.0, 40.0))]);
        assert_eq!(e.session().unwrap().last_position(), Some(Point::new(10.0, 40.0)));
    }

    #[test]
    fn notified_ticks_advance_until_extreme() {
        let t = Instant::now();
        let config = ReorderConfig {
            scroll_notifications: true,
            ..ReorderConfig::default()
        };
        let scroll = FakeScroll::new(0.0);
        let mut e = ReorderEngine::new(vec!["A", "B", "C"], config)
            .unwrap()
            .with_observer(Recorder::default())
            .with_scrollable(scroll.clone());
        let metrics = ScrollMetrics {
            offset: 100.0,
            min_scroll_extent: 0.0,
            max_scroll_extent: 130.0,
            viewport_start: 0.0,
            viewport_extent: 100.0,
        };
        e.handle(DragEvent::Scroll(ScrollNotification::Update(metrics)), t);
        start(&mut e, "A", t);
        move_to(&mut e, 95.0, t);
        assert!(e.is_auto_scrolling());

        // Three ticks of one margin each, then the fourth finds the end.
        e.poll(t + MS_100 * 4);
        let targets: Vec<f32> = scroll.state.borrow().1.iter().map(|c| c.0).collect();
        assert_eq!(targets, vec![110.0, 120.0, 130.0]);
        assert!(!e.is_auto_scrolling());
        assert!(!e.is_scroll_suppressed());
        assert_eq!(e.next_deadline(), None);

        // With the timer stopped, a dwell commits again.
        hover(&mut e, "C", Slot::After, t + MS_100 * 4);
        e.poll(t + MS_100 * 4 + MS_200);
        assert_eq!(e.items(), &["B", "A", "C"]);
    }
}
