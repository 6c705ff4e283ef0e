#![forbid(unsafe_code)]

//! Error and diagnostic types.
//!
//! Nothing on the gesture path returns `Err`. Recoverable conditions are
//! reported as a [`ReorderError`] through the diagnostic channel
//! (`tracing::warn!` plus [`ReorderObserver::diagnostic`]) and the optional
//! behavior is skipped. Only construction and config loading fail with
//! `Result`.
//!
//! [`ReorderObserver::diagnostic`]: crate::engine::ReorderObserver::diagnostic

use std::path::PathBuf;

/// Conditions reported on the diagnostic channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    /// A drag moved while no [`Scrollable`] is attached. Notification
    /// metrics alone cannot drive a scroll. Reported once per engine.
    ///
    /// [`Scrollable`]: crate::auto_scroll::Scrollable
    #[error("no scrollable is attached; edge auto-scroll is disabled")]
    NoScrollable,

    /// A drag was requested for an item in the non-draggable set.
    #[error("item {id} is not draggable")]
    NotDraggable {
        /// Debug rendering of the item id.
        id: String,
    },

    /// An event referenced an item that is not in the collection.
    #[error("item {id} is not in the collection")]
    UnknownItem {
        /// Debug rendering of the item id.
        id: String,
    },

    /// Two items in a collection share an id.
    #[error("duplicate item id {id} in collection")]
    DuplicateItem {
        /// Debug rendering of the item id.
        id: String,
    },

    /// A second drag started while multi-item drag is disabled.
    #[error("drag of {requested} rejected: {active} is already being dragged")]
    DragAlreadyActive {
        /// Debug rendering of the item being dragged.
        active: String,
        /// Debug rendering of the item that asked to start.
        requested: String,
    },
}

impl ReorderError {
    pub(crate) fn not_draggable(id: &impl std::fmt::Debug) -> Self {
        Self::NotDraggable {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn unknown_item(id: &impl std::fmt::Debug) -> Self {
        Self::UnknownItem {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn duplicate_item(id: &impl std::fmt::Debug) -> Self {
        Self::DuplicateItem {
            id: format!("{id:?}"),
        }
    }

    /// Short machine-readable tag for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoScrollable => "no_scrollable",
            Self::NotDraggable { .. } => "not_draggable",
            Self::UnknownItem { .. } => "unknown_item",
            Self::DuplicateItem { .. } => "duplicate_item",
            Self::DragAlreadyActive { .. } => "drag_already_active",
        }
    }
}

/// Errors from building or loading a [`ReorderConfig`](crate::config::ReorderConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File read failure.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parse failure.
    #[cfg(feature = "config-files")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse failure.
    #[cfg(feature = "config-files")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more values are out of range.
    #[error("invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// The initial collection was rejected.
    #[error(transparent)]
    Collection(#[from] ReorderError),
}
