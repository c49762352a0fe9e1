use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{AnalysisError, Result};

/// Targets that receive log output. The library and the binary share one name.
const CRATE_TARGETS: &[&str] = &["hydat_trends"];

/// Map the `-v` count to a level.
///
/// - quiet      -> error
/// - 0 (none)   -> warn
/// - 1 (-v)     -> info
/// - 2 (-vv)    -> debug
/// - 3+ (-vvv)  -> trace
pub fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn default_filter(level: &str) -> String {
    CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize tracing. `RUST_LOG` overrides the CLI flags if set.
///
/// With `log_file`, plain text is appended to that file instead of stderr.
pub fn init(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level_for(verbosity, quiet))));

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| AnalysisError::Config(format!("Failed to install logger: {}", e)))
}
