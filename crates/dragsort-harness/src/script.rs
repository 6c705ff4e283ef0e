#![forbid(unsafe_code)]

//! JSON replay scripts.
//!
//! A script names the initial items, the simulated viewport, and a list of
//! timestamped steps. Step times are milliseconds from the start of the run
//! and must not go backwards.
//!
//! ```json
//! {
//!   "items": ["inbox", "drafts", "sent"],
//!   "viewport": { "offset": 0, "max": 400, "extent": 200 },
//!   "steps": [
//!     { "at_ms": 0,   "event": { "type": "start", "item": "sent" } },
//!     { "at_ms": 10,  "event": { "type": "enter", "target": "inbox", "slot": "before" } },
//!     { "at_ms": 400, "event": { "type": "complete" } }
//!   ]
//! }
//! ```

use serde::Deserialize;

use dragsort_core::{ScrollMetrics, Slot};

/// A whole replay.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Initial collection.
    pub items: Vec<String>,
    /// Items that cannot be dragged.
    #[serde(default)]
    pub non_draggable: Vec<String>,
    /// Simulated scrollable; omit to run without one.
    #[serde(default)]
    pub viewport: Option<ViewportSpec>,
    /// Timestamped inputs.
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Index of the first step whose time goes backwards.
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.steps
            .windows(2)
            .position(|pair| pair[1].at_ms < pair[0].at_ms)
            .map(|i| i + 1)
    }
}

/// Initial scroll state of the simulated viewport.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportSpec {
    /// Starting offset.
    #[serde(default)]
    pub offset: f32,
    /// Minimum offset.
    #[serde(default)]
    pub min: f32,
    /// Maximum offset.
    pub max: f32,
    /// Leading edge of the viewport in pointer coordinates.
    #[serde(default)]
    pub start: f32,
    /// Viewport length along the scroll axis.
    pub extent: f32,
}

impl From<ViewportSpec> for ScrollMetrics {
    fn from(spec: ViewportSpec) -> Self {
        ScrollMetrics {
            offset: spec.offset,
            min_scroll_extent: spec.min,
            max_scroll_extent: spec.max,
            viewport_start: spec.start,
            viewport_extent: spec.extent,
        }
    }
}

/// One input at a point in simulated time.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Milliseconds since the run started.
    pub at_ms: u64,
    /// The input.
    pub event: StepEvent,
}

/// Side of a target, as written in scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSpec {
    Before,
    After,
}

impl From<SlotSpec> for Slot {
    fn from(spec: SlotSpec) -> Self {
        match spec {
            SlotSpec::Before => Slot::Before,
            SlotSpec::After => Slot::After,
        }
    }
}

/// Script-level inputs. Most map one-to-one onto engine events; `size`
/// and `items` call the engine's measurement and collection APIs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    Start {
        item: String,
    },
    Move {
        x: f32,
        y: f32,
    },
    Enter {
        target: String,
        slot: SlotSpec,
    },
    Leave {
        target: String,
        slot: SlotSpec,
    },
    Drop {
        target: String,
        slot: SlotSpec,
    },
    Cancel,
    End,
    Complete,
    Animate {
        animating: bool,
    },
    Size {
        item: String,
        width: f32,
        height: f32,
    },
    Items {
        items: Vec<String>,
    },
    ScrollStart,
    ScrollUpdate {
        offset: f32,
    },
    ScrollEnd,
}
