#![forbid(unsafe_code)]

//! Edge auto-scroll while a drag hovers near the viewport boundary.
//!
//! [`AutoScrollController`] watches the pointer position along the scroll
//! axis. When it enters the edge margin and the scrollable can still move in
//! that direction, a periodic timer starts; every tick asks the scrollable to
//! animate by one margin's worth of pixels over one period with linear
//! easing, so consecutive ticks compose into constant-velocity scrolling.
//!
//! # Invariants
//!
//! 1. At most one timer runs, tagged with a [`ScrollDirection`]. Starting a
//!    timer in the other direction stops the running one first.
//! 2. The [`ScrollSignal`] is held by [`ScrollSource::AutoScroll`] exactly
//!    while the timer runs.
//! 3. A tick that finds the viewport already at its extreme stops the timer
//!    and lowers the signal instead of scrolling.
//! 4. `stop()` is idempotent.
//!
//! # Failure Modes
//!
//! - Zero or negative viewport extent: the margin is zero, so no position is
//!   ever inside it and the controller stays idle.

use web_time::{Duration, Instant};

use crate::scroll_signal::{ScrollSignal, ScrollSource};
use crate::timer::Periodic;

/// Default fraction of the viewport extent used as the edge margin.
pub const DEFAULT_EDGE_FRACTION: f32 = 0.1;

/// Default period between auto-scroll ticks.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Direction of an auto-scroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Toward `min_scroll_extent`.
    ToStart,
    /// Toward `max_scroll_extent`.
    ToEnd,
}

/// Interpolation curve for a scroll animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant velocity. Consecutive ticks compose into a steady scroll.
    #[default]
    Linear,
}

/// Snapshot of a scrollable's position and viewport along its scroll axis.
///
/// `viewport_start` is the leading edge of the viewport in the same
/// coordinate space as drag positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Current scroll offset in pixels.
    pub offset: f32,
    /// Smallest reachable offset.
    pub min_scroll_extent: f32,
    /// Largest reachable offset.
    pub max_scroll_extent: f32,
    /// Leading edge of the viewport along the scroll axis.
    pub viewport_start: f32,
    /// Length of the viewport along the scroll axis.
    pub viewport_extent: f32,
}

impl ScrollMetrics {
    /// Whether the offset cannot move further toward the start.
    #[inline]
    pub fn at_start(&self) -> bool {
        self.offset <= self.min_scroll_extent
    }

    /// Whether the offset cannot move further toward the end.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.offset >= self.max_scroll_extent
    }

    /// Whether the offset is at the extreme for `direction`.
    pub fn at_extreme(&self, direction: ScrollDirection) -> bool {
        match direction {
            ScrollDirection::ToStart => self.at_start(),
            ScrollDirection::ToEnd => self.at_end(),
        }
    }

    /// Trailing edge of the viewport.
    #[inline]
    pub fn viewport_end(&self) -> f32 {
        self.viewport_start + self.viewport_extent
    }
}

/// The host's scrollable surface.
pub trait Scrollable {
    /// Current offset, extents and viewport.
    fn metrics(&self) -> ScrollMetrics;

    /// Begin animating the offset to `offset` over `duration`.
    fn animate_to(&mut self, offset: f32, duration: Duration, easing: Easing);
}

impl<S: Scrollable + ?Sized> Scrollable for Box<S> {
    fn metrics(&self) -> ScrollMetrics {
        (**self).metrics()
    }

    fn animate_to(&mut self, offset: f32, duration: Duration, easing: Easing) {
        (**self).animate_to(offset, duration, easing);
    }
}

/// Tunables for edge auto-scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScrollConfig {
    /// Edge margin as a fraction of the viewport extent (default: 0.1).
    pub edge_fraction: f32,
    /// Period between ticks (default: 100ms).
    pub period: Duration,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            edge_fraction: DEFAULT_EDGE_FRACTION,
            period: DEFAULT_TICK_PERIOD,
        }
    }
}

/// Effect of feeding a pointer position to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAction {
    /// A timer started in this direction.
    Started(ScrollDirection),
    /// The running timer was stopped.
    Stopped,
    /// Nothing changed.
    Unchanged,
}

/// Effect of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Animate the scrollable to `target` over `duration`.
    Scroll {
        /// Direction of travel.
        direction: ScrollDirection,
        /// Destination offset, clamped to the scroll extents.
        target: f32,
        /// Animation length (one tick period).
        duration: Duration,
        /// Always [`Easing::Linear`].
        easing: Easing,
    },
    /// The extreme was reached; the timer stopped.
    Finished(ScrollDirection),
}

/// Drives edge auto-scroll from pointer positions and timer ticks.
#[derive(Debug, Clone)]
pub struct AutoScrollController {
    config: AutoScrollConfig,
    timer: Periodic,
    direction: Option<ScrollDirection>,
    signal: ScrollSignal,
}

impl AutoScrollController {
    /// Create an idle controller that raises `signal` while scrolling.
    pub fn new(config: AutoScrollConfig, signal: ScrollSignal) -> Self {
        Self {
            config,
            timer: Periodic::new(),
            direction: None,
            signal,
        }
    }

    /// The configured tunables.
    #[inline]
    pub fn config(&self) -> &AutoScrollConfig {
        &self.config
    }

    /// Edge margin for `metrics`.
    #[must_use]
    pub fn margin(&self, metrics: &ScrollMetrics) -> f32 {
        (metrics.viewport_extent * self.config.edge_fraction).max(0.0)
    }

    /// Direction of the running timer.
    #[inline]
    pub fn direction(&self) -> Option<ScrollDirection> {
        self.direction
    }

    /// Whether a timer is running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }

    /// When the next tick is due.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Which edge, if any, `position` is inside of, ignoring extents.
    #[must_use]
    pub fn edge_at(&self, position: f32, metrics: &ScrollMetrics) -> Option<ScrollDirection> {
        let margin = self.margin(metrics);
        if margin <= 0.0 {
            return None;
        }
        if position < metrics.viewport_start + margin {
            Some(ScrollDirection::ToStart)
        } else if position > metrics.viewport_end() - margin {
            Some(ScrollDirection::ToEnd)
        } else {
            None
        }
    }

    /// Feed the pointer position projected onto the scroll axis.
    ///
    /// Starts a timer when `position` is within the margin of an edge the
    /// scrollable can still move toward; otherwise stops any running timer.
    /// A timer already running in the wanted direction is left alone.
    pub fn update(&mut self, position: f32, metrics: &ScrollMetrics, now: Instant) -> EdgeAction {
        let wanted = self
            .edge_at(position, metrics)
            .filter(|direction| !metrics.at_extreme(*direction));

        match wanted {
            Some(direction) if self.direction == Some(direction) => EdgeAction::Unchanged,
            Some(direction) => {
                self.stop();
                self.timer.start(now, self.config.period);
                self.direction = Some(direction);
                self.signal.raise(ScrollSource::AutoScroll);
                tracing::debug!(?direction, position, "edge auto-scroll started");
                EdgeAction::Started(direction)
            }
            None if self.stop() => EdgeAction::Stopped,
            None => EdgeAction::Unchanged,
        }
    }

    /// Stop the running timer and lower the signal. Returns whether a timer
    /// was running.
    pub fn stop(&mut self) -> bool {
        let was_active = self.timer.is_active();
        self.timer.cancel();
        self.direction = None;
        self.signal.lower(ScrollSource::AutoScroll);
        if was_active {
            tracing::debug!("edge auto-scroll stopped");
        }
        was_active
    }

    /// Consume one due tick, if any, against the current `metrics`.
    pub fn poll(&mut self, now: Instant, metrics: &ScrollMetrics) -> Option<TickOutcome> {
        let direction = self.direction?;
        self.timer.poll(now)?;

        if metrics.at_extreme(direction) {
            self.stop();
            return Some(TickOutcome::Finished(direction));
        }

        let margin = self.margin(metrics);
        let target = match direction {
            ScrollDirection::ToStart => metrics.offset - margin,
            ScrollDirection::ToEnd => metrics.offset + margin,
        }
        .clamp(metrics.min_scroll_extent, metrics.max_scroll_extent.max(metrics.min_scroll_extent));

        tracing::trace!(?direction, from = metrics.offset, to = target, "auto-scroll tick");
        Some(TickOutcome::Scroll {
            direction,
            target,
            duration: self.config.period,
            easing: Easing::Linear,
        })
    }
}
