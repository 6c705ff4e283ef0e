#![forbid(unsafe_code)]

//! Core: drag-to-reorder state machine for keyed collections.
//!
//! # Role in dragsort
//! `dragsort-core` decides *when* and *where* a dragged item moves. It does
//! not draw anything and does not recognize gestures. A host UI layer turns
//! pointer input into [`DragEvent`]s, feeds them to a [`ReorderEngine`], and
//! renders whatever order the engine reports.
//!
//! # Primary responsibilities
//! - **ReorderEngine**: owns the collection and the drag session; commits
//!   provisional reorders.
//! - **AcceptDebouncer**: single-slot dwell so hovering does not thrash.
//! - **AutoScrollController**: constant-velocity scrolling while the pointer
//!   sits near a viewport edge.
//! - **SizeRegistry**: last measured size per item, for feedback and drop
//!   zones.
//! - **DropZonePair**: the insert-before / insert-after halves of each item.
//!
//! # Time
//! Nothing reads the clock. Every entry point takes `now: Instant` and
//! [`ReorderEngine::next_deadline`] tells the host when to call
//! [`ReorderEngine::poll`] again, so tests run on a simulated clock.
//!
//! ```
//! use dragsort_core::{DragEvent, ReorderConfig, ReorderEngine, Slot};
//! use web_time::{Duration, Instant};
//!
//! let mut engine = ReorderEngine::new(vec!["a", "b", "c"], ReorderConfig::default()).unwrap();
//! let t = Instant::now();
//! engine.handle(DragEvent::DragStart { item: "a" }, t);
//! engine.handle(DragEvent::ZoneEnter { target: "c", slot: Slot::Before }, t);
//! engine.poll(t + Duration::from_millis(200));
//! assert_eq!(engine.items(), &["b", "a", "c"]);
//! ```

pub mod auto_scroll;
pub mod collection;
pub mod config;
pub mod debounce;
pub mod drop_zone;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod scroll_signal;
pub mod size_registry;
pub mod timer;

pub use auto_scroll::{
    AutoScrollConfig, AutoScrollController, Easing, ScrollDirection, ScrollMetrics, Scrollable,
};
pub use collection::{Identify, OrderedCollection, Slot};
pub use config::{DragActivation, HitTestBehavior, ReorderConfig};
pub use debounce::{AcceptDebouncer, PendingAccept};
pub use drop_zone::{DropZone, DropZonePair};
pub use engine::{
    AcceptDecision, AnimationPhase, DragDetails, DragEvent, DragFeedback, DragHandle,
    DragSession, ReorderEngine, ReorderObserver, ScrollNotification,
};
pub use error::{ConfigError, ReorderError};
pub use geometry::{Axis, Point, Rect, Size};
pub use scroll_signal::{ScrollSignal, ScrollSource};
pub use size_registry::SizeRegistry;

// Re-export tracing macros at crate root for ergonomic use.
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
