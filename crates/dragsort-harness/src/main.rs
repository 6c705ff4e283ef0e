#![forbid(unsafe_code)]

//! Scripted replay bench for the reorder engine.
//!
//! Reads a JSON script of timestamped drag inputs, replays it against a
//! [`ReorderEngine`](dragsort_core::ReorderEngine) on a simulated clock with
//! an in-memory viewport, and prints a JSON report with the final order,
//! every observer callback, and any diagnostics.
//!
//! # Running
//!
//! ```sh
//! cargo run -p dragsort-harness -- crates/dragsort-harness/scripts/inbox.json
//! ```
//!
//! # Environment
//!
//! - `DRAGSORT_HARNESS_SCRIPT`: script path when none is passed as an argument
//! - `DRAGSORT_HARNESS_CONFIG`: engine config, `.json` or TOML
//! - `DRAGSORT_HARNESS_SETTLE_MS`: time to keep polling after the last step
//!   (default 1000)
//! - `DRAGSORT_HARNESS_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: log filter (default `warn`)

mod error;
mod replay;
mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dragsort_core::ReorderConfig;
use dragsort_core::logging::{self, LogFormat};
use web_time::Duration;

use crate::error::HarnessError;
use crate::replay::{DEFAULT_SETTLE, Replay};
use crate::script::Script;

/// Resolved command-line and environment settings.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    script: PathBuf,
    config: Option<PathBuf>,
    settle: Duration,
    log_format: LogFormat,
}

impl Settings {
    /// Resolve from an optional positional argument and an env lookup.
    fn resolve(
        arg: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, HarnessError> {
        let script = arg
            .or_else(|| env("DRAGSORT_HARNESS_SCRIPT"))
            .map(PathBuf::from)
            .ok_or(HarnessError::MissingScript)?;
        let config = env("DRAGSORT_HARNESS_CONFIG").map(PathBuf::from);

        let settle = match env("DRAGSORT_HARNESS_SETTLE_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| HarnessError::Env {
                    name: "DRAGSORT_HARNESS_SETTLE_MS",
                    value,
                })?,
            None => DEFAULT_SETTLE,
        };

        let log_format = match env("DRAGSORT_HARNESS_LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value).ok_or(HarnessError::Env {
                name: "DRAGSORT_HARNESS_LOG_FORMAT",
                value,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            script,
            config,
            settle,
            log_format,
        })
    }
}

fn read(path: &Path) -> Result<String, HarnessError> {
    std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path: Option<&Path>) -> Result<ReorderConfig, HarnessError> {
    let Some(path) = path else {
        return Ok(ReorderConfig::default());
    };
    let config = if path.extension().is_some_and(|ext| ext == "json") {
        ReorderConfig::from_json_file(path)?
    } else {
        ReorderConfig::from_toml_file(path)?
    };
    tracing::debug!(path = %path.display(), "loaded engine config");
    Ok(config)
}

fn run() -> Result<(), HarnessError> {
    let settings = Settings::resolve(std::env::args().nth(1), |name| std::env::var(name).ok())?;
    logging::init(settings.log_format);

    let script = Script::from_json(&read(&settings.script)?)?;
    let config = load_config(settings.config.as_deref())?;
    let report = Replay::run(&script, config, settings.settle)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "replay failed");
            eprintln!("dragsort-harness: {err}");
            ExitCode::FAILURE
        }
    }
}
