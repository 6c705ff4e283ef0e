#![forbid(unsafe_code)]

use std::path::PathBuf;

use dragsort_core::{ConfigError, ReorderError};

/// Everything that stops a replay.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("no script given; pass a path or set DRAGSORT_HARNESS_SCRIPT")]
    MissingScript,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("step {index} is earlier than the step before it")]
    OutOfOrder { index: usize },

    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Collection(#[from] ReorderError),
}
