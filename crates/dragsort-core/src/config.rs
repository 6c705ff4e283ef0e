#![forbid(unsafe_code)]

//! Constructor-time configuration for a [`ReorderEngine`].
//!
//! Every knob lives in one [`ReorderConfig`] that can be built in code or,
//! with the `config-files` feature, loaded from TOML or JSON. Defaults match
//! the engine's built-in constants, so `ReorderConfig::default()` is the
//! stock behavior.
//!
//! ```toml
//! # dragsort.toml
//! activation = { long_press = { delay_ms = 300 } }
//! scroll_axis = "horizontal"
//! edge_scroll_fraction = 0.15
//! accept_delay_ms = 250
//! ```
//!
//! [`ReorderEngine`]: crate::engine::ReorderEngine

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::auto_scroll::{AutoScrollConfig, DEFAULT_EDGE_FRACTION, DEFAULT_TICK_PERIOD};
use crate::debounce::DEFAULT_ACCEPT_DELAY;
#[cfg(feature = "config-files")]
use crate::error::ConfigError;
use crate::geometry::Axis;

/// How a drag begins on an item's handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(rename_all = "snake_case"))]
pub enum DragActivation {
    /// Drag starts as soon as the pointer moves.
    Immediate,
    /// Drag starts after the pointer is held still for `delay`.
    LongPress {
        /// Hold duration before the drag activates.
        #[cfg_attr(feature = "config-files", serde(rename = "delay_ms", with = "millis"))]
        delay: Duration,
    },
}

impl Default for DragActivation {
    fn default() -> Self {
        Self::LongPress {
            delay: Duration::from_millis(500),
        }
    }
}

/// How drop zones participate in the host's hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(rename_all = "snake_case"))]
pub enum HitTestBehavior {
    /// Only hit where the item's content is hit.
    DeferToChild,
    /// Hit anywhere in the zone and block targets behind it.
    Opaque,
    /// Hit anywhere in the zone and let targets behind it see the event too.
    #[default]
    Translucent,
}

/// All tunables for one engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct ReorderConfig {
    /// Press-and-hold versus immediate drag start.
    pub activation: DragActivation,
    /// Primary layout axis; drop zones split along it.
    pub layout_axis: Axis,
    /// Axis the viewport scrolls along.
    pub scroll_axis: Axis,
    /// Hit-testing mode handed to drop zones and drag handles.
    pub hit_test: HitTestBehavior,
    /// Opacity of the floating drag feedback, in `[0, 1]`.
    pub feedback_opacity: f32,
    /// Edge margin as a fraction of the viewport extent.
    pub edge_scroll_fraction: f32,
    /// Period between auto-scroll ticks.
    #[cfg_attr(feature = "config-files", serde(rename = "edge_scroll_period_ms", with = "millis"))]
    pub edge_scroll_period: Duration,
    /// Dwell before a hover commits a provisional reorder.
    #[cfg_attr(feature = "config-files", serde(rename = "accept_delay_ms", with = "millis"))]
    pub accept_delay: Duration,
    /// Reject a second drag while one is active.
    pub disable_multi_drag: bool,
    /// Take viewport metrics and user-scroll state from host scroll
    /// notifications instead of querying the scrollable directly.
    pub scroll_notifications: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            activation: DragActivation::default(),
            layout_axis: Axis::Vertical,
            scroll_axis: Axis::Vertical,
            hit_test: HitTestBehavior::default(),
            feedback_opacity: 0.8,
            edge_scroll_fraction: DEFAULT_EDGE_FRACTION,
            edge_scroll_period: DEFAULT_TICK_PERIOD,
            accept_delay: DEFAULT_ACCEPT_DELAY,
            disable_multi_drag: true,
            scroll_notifications: false,
        }
    }
}

impl ReorderConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read(path.as_ref())?)
    }

    /// Check every parameter is in range.
    ///
    /// Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.edge_scroll_fraction > 0.0 && self.edge_scroll_fraction <= 0.5) {
            errors.push(format!(
                "edge_scroll_fraction must be in (0, 0.5], got {}",
                self.edge_scroll_fraction
            ));
        }
        if self.edge_scroll_period.is_zero() {
            errors.push("edge_scroll_period must be non-zero".to_string());
        }
        if self.accept_delay.is_zero() {
            errors.push("accept_delay must be non-zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.feedback_opacity) {
            errors.push(format!(
                "feedback_opacity must be in [0, 1], got {}",
                self.feedback_opacity
            ));
        }
        if let DragActivation::LongPress { delay } = self.activation
            && delay.is_zero()
        {
            errors.push("long_press delay must be non-zero; use immediate instead".to_string());
        }

        errors
    }

    /// Auto-scroll tunables derived from this config.
    #[must_use]
    pub fn auto_scroll(&self) -> AutoScrollConfig {
        AutoScrollConfig {
            edge_fraction: self.edge_scroll_fraction,
            period: self.edge_scroll_period,
        }
    }

    /// `Some(1)` when multi-item drag is disabled, unbounded otherwise.
    #[must_use]
    pub fn max_simultaneous_drags(&self) -> Option<u32> {
        self.disable_multi_drag.then_some(1)
    }
}

#[cfg(feature = "config-files")]
fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(feature = "config-files")]
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
