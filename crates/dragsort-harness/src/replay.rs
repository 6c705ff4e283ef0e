#![forbid(unsafe_code)]

//! Deterministic replay of a [`Script`] on a simulated clock.
//!
//! The clock only moves forward. Between steps it jumps from one engine
//! deadline to the next, polling at each, so timer behavior matches a real
//! event loop that wakes exactly on [`ReorderEngine::next_deadline`].

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use web_time::{Duration, Instant};

use dragsort_core::{
    AnimationPhase, DragDetails, DragEvent, Easing, Point, ReorderConfig, ReorderEngine,
    ReorderError, ReorderObserver, ScrollMetrics, ScrollNotification, Scrollable, Size, Slot,
};

use crate::error::HarnessError;
use crate::script::{Script, StepEvent};

/// Default time to keep polling after the last step.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);

// ---------------------------------------------------------------------------
// Simulated viewport
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ViewState {
    metrics: ScrollMetrics,
    animations: u32,
}

/// In-memory scrollable. Animations land instantly, clamped to the extents.
#[derive(Debug, Clone)]
pub struct SimViewport {
    state: Rc<RefCell<ViewState>>,
}

impl SimViewport {
    /// A viewport starting at `metrics`. Clones share state.
    pub fn new(metrics: ScrollMetrics) -> Self {
        Self {
            state: Rc::new(RefCell::new(ViewState {
                metrics,
                animations: 0,
            })),
        }
    }

    /// Current scroll offset.
    pub fn offset(&self) -> f32 {
        self.state.borrow().metrics.offset
    }

    /// Number of `animate_to` calls received.
    pub fn animations(&self) -> u32 {
        self.state.borrow().animations
    }

    /// Move the viewport as if the user scrolled it.
    fn scroll_to(&self, offset: f32) -> ScrollMetrics {
        let mut state = self.state.borrow_mut();
        let m = &mut state.metrics;
        m.offset = offset.clamp(m.min_scroll_extent, m.max_scroll_extent.max(m.min_scroll_extent));
        *m
    }
}

impl Scrollable for SimViewport {
    fn metrics(&self) -> ScrollMetrics {
        self.state.borrow().metrics
    }

    fn animate_to(&mut self, offset: f32, duration: Duration, easing: Easing) {
        tracing::trace!(offset, ?duration, ?easing, "viewport animate");
        self.scroll_to(offset);
        self.state.borrow_mut().animations += 1;
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Observer that writes every callback as one line.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<String>,
    reorders: usize,
    diagnostics: Vec<String>,
}

fn side(slot: Slot) -> &'static str {
    if slot.is_before() { "before" } else { "after" }
}

impl ReorderObserver<String> for Transcript {
    fn drag_started(&mut self, item: &String) {
        self.lines.push(format!("started {item}"));
    }

    fn drag_cancelled(&mut self, item: &String, _velocity: Point, _offset: Point) {
        self.lines.push(format!("cancelled {item}"));
    }

    fn drag_ended(&mut self, item: &String, _details: &DragDetails) {
        self.lines.push(format!("ended {item}"));
    }

    fn drag_completed(&mut self, item: &String) {
        self.lines.push(format!("completed {item}"));
    }

    fn accepted(&mut self, moved: &String, target: &String, slot: Slot) {
        self.lines
            .push(format!("accepted {moved} {} {target}", side(slot)));
    }

    fn left(&mut self, moved: &String, target: &String, slot: Slot) {
        self.lines.push(format!("left {moved} {} {target}", side(slot)));
    }

    fn reordered(&mut self, items: &[String]) {
        self.reorders += 1;
        self.lines.push(format!("reordered [{}]", items.join(", ")));
    }

    fn sizes_ready(&mut self) {
        self.lines.push("sizes ready".to_string());
    }

    fn diagnostic(&mut self, error: &ReorderError) {
        self.diagnostics.push(error.to_string());
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Outcome of a replay, printed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub final_order: Vec<String>,
    pub reorders: usize,
    pub diagnostics: Vec<String>,
    pub scroll_offset: Option<f32>,
    pub scroll_animations: u32,
    pub elapsed_ms: u64,
    pub transcript: Vec<String>,
}

/// A running replay.
pub struct Replay {
    engine: ReorderEngine<String, Transcript>,
    viewport: Option<SimViewport>,
    start: Instant,
    now: Instant,
}

impl Replay {
    /// Build the engine described by `script`.
    pub fn new(script: &Script, config: ReorderConfig) -> Result<Self, HarnessError> {
        if let Some(index) = script.first_out_of_order() {
            return Err(HarnessError::OutOfOrder { index });
        }
        let viewport = script.viewport.map(|spec| SimViewport::new(spec.into()));
        let engine = ReorderEngine::new(script.items.clone(), config)?
            .with_non_draggable(script.non_draggable.iter().cloned())
            .with_observer(Transcript::default());
        let engine = match &viewport {
            Some(vp) => engine.with_scrollable(Box::new(vp.clone()) as Box<dyn Scrollable>),
            None => engine,
        };
        let start = Instant::now();
        Ok(Self {
            engine,
            viewport,
            start,
            now: start,
        })
    }

    /// Run `script` to completion, then keep polling for `settle`.
    pub fn run(script: &Script, config: ReorderConfig, settle: Duration) -> Result<Report, HarnessError> {
        let mut replay = Self::new(script, config)?;
        let span = tracing::debug_span!("replay", steps = script.steps.len());
        let _guard = span.enter();

        for step in &script.steps {
            replay.advance_to(replay.start + Duration::from_millis(step.at_ms));
            replay.apply(&step.event)?;
        }
        replay.advance_to(replay.now + settle);
        Ok(replay.finish())
    }

    /// Move the clock to `target`, polling at every deadline on the way.
    pub fn advance_to(&mut self, target: Instant) {
        while let Some(deadline) = self.engine.next_deadline()
            && deadline <= target
        {
            self.now = self.now.max(deadline);
            self.engine.poll(self.now);
        }
        self.now = self.now.max(target);
        self.engine.poll(self.now);
    }

    /// Feed one script step to the engine at the current time.
    pub fn apply(&mut self, event: &StepEvent) -> Result<(), HarnessError> {
        let now = self.now;
        let event = match event {
            StepEvent::Start { item } => DragEvent::DragStart { item: item.clone() },
            StepEvent::Move { x, y } => DragEvent::DragMove {
                details: DragDetails::at(Point::new(*x, *y)),
            },
            StepEvent::Enter { target, slot } => DragEvent::ZoneEnter {
                target: target.clone(),
                slot: (*slot).into(),
            },
            StepEvent::Leave { target, slot } => DragEvent::ZoneLeave {
                target: target.clone(),
                slot: (*slot).into(),
            },
            StepEvent::Drop { target, slot } => DragEvent::Drop {
                target: target.clone(),
                slot: (*slot).into(),
            },
            StepEvent::Cancel => DragEvent::DragCancel {
                velocity: Point::ZERO,
                offset: Point::ZERO,
            },
            StepEvent::End => DragEvent::DragEnd {
                details: DragDetails::default(),
            },
            StepEvent::Complete => DragEvent::DragComplete,
            StepEvent::Animate { animating } => DragEvent::AnimationPhase(if *animating {
                AnimationPhase::Animating
            } else {
                AnimationPhase::Idle
            }),
            StepEvent::Size {
                item,
                width,
                height,
            } => {
                self.engine
                    .report_size(item.clone(), Size::new(*width, *height));
                return Ok(());
            }
            StepEvent::Items { items } => {
                self.engine.set_items(items.clone())?;
                return Ok(());
            }
            StepEvent::ScrollStart => DragEvent::Scroll(ScrollNotification::Start),
            StepEvent::ScrollUpdate { offset } => {
                let Some(viewport) = &self.viewport else {
                    tracing::warn!("scroll_update step ignored: script has no viewport");
                    return Ok(());
                };
                DragEvent::Scroll(ScrollNotification::Update(viewport.scroll_to(*offset)))
            }
            StepEvent::ScrollEnd => DragEvent::Scroll(ScrollNotification::End),
        };
        tracing::trace!(?event, "step");
        self.engine.handle(event, now);
        Ok(())
    }

    fn finish(self) -> Report {
        let elapsed_ms = u64::try_from(self.now.duration_since(self.start).as_millis()).unwrap_or(u64::MAX);
        let scroll_offset = self.viewport.as_ref().map(SimViewport::offset);
        let scroll_animations = self.viewport.as_ref().map_or(0, SimViewport::animations);
        let transcript = self.engine.observer();
        let reorders = transcript.reorders;
        let diagnostics = transcript.diagnostics.clone();
        let lines = transcript.lines.clone();
        Report {
            final_order: self.engine.into_items(),
            reorders,
            diagnostics,
            scroll_offset,
            scroll_animations,
            elapsed_ms,
            transcript: lines,
        }
    }
}
