#![forbid(unsafe_code)]

//! Structured logging.
//!
//! The engine logs through `tracing` and never installs a subscriber itself.
//! Levels used:
//!
//! - `warn`: diagnostics (the same [`ReorderError`]s the observer receives),
//!   with a `kind` field.
//! - `debug`: session start and end, committed reorders, auto-scroll start
//!   and stop, collection replacement.
//! - `trace`: per-event detail, ignored events, auto-scroll ticks, and the
//!   `reorder.poll` span.
//!
//! Binaries can call [`init`] (feature `subscriber`) to install a formatter
//! filtered by `RUST_LOG`.
//!
//! [`ReorderError`]: crate::error::ReorderError

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    #[default]
    Pretty,
    /// Newline-delimited JSON (feature `tracing-json`).
    Json,
}

impl LogFormat {
    /// Parse `"pretty"` or `"json"`, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Install a global subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `warn`).
///
/// Returns `false` if a global subscriber was already set. Without the
/// `tracing-json` feature, [`LogFormat::Json`] falls back to pretty output.
#[cfg(feature = "subscriber")]
pub fn init(format: LogFormat) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        #[cfg(feature = "tracing-json")]
        LogFormat::Json => builder.json().try_init().is_ok(),
        _ => builder.try_init().is_ok(),
    }
}
