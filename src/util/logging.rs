// faamcat - util/logging.rs
//
// Structured logging for the CLI and library.
//
// Level sources, highest first:
//   - RUST_LOG (full EnvFilter syntax, applied verbatim)
//   - --debug
//   - [logging] level in config.toml
//   - DEFAULT_LOG_LEVEL
//
// Except for RUST_LOG, the chosen level applies to faamcat's own targets;
// dependencies stay at "warn". Output goes to stderr so --json output on
// stdout stays clean.

use super::constants::{APP_NAME, APP_VERSION, DEFAULT_LOG_LEVEL};
use tracing_subscriber::EnvFilter;

/// Filter directive scoping `level` to this crate.
fn scoped_directive(level: &str) -> String {
    format!("warn,{APP_NAME}={}", level.trim().to_ascii_lowercase())
}

/// Build the filter for the given flag and configured level.
///
/// An unparsable configured level falls back to the default; the returned
/// string names it so the caller can warn once logging is up.
fn build_filter(debug_flag: bool, config_level: Option<&str>) -> (EnvFilter, Option<String>) {
    if std::env::var("RUST_LOG").is_ok() {
        return (EnvFilter::from_default_env(), None);
    }
    if debug_flag {
        return (EnvFilter::new(scoped_directive("debug")), None);
    }
    match config_level {
        Some(level) => match EnvFilter::try_new(scoped_directive(level)) {
            Ok(filter) => (filter, None),
            Err(_) => (
                EnvFilter::new(scoped_directive(DEFAULT_LOG_LEVEL)),
                Some(level.to_string()),
            ),
        },
        None => (EnvFilter::new(scoped_directive(DEFAULT_LOG_LEVEL)), None),
    }
}

/// Initialise the logging subsystem. Later calls are no-ops.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let (filter, rejected) = build_filter(debug_flag, config_level);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .try_init()
        .is_ok();
    if !installed {
        return;
    }

    if let Some(level) = rejected {
        tracing::warn!(level = %level, fallback = DEFAULT_LOG_LEVEL, "Unknown log level in config");
    }
    tracing::debug!(app = APP_NAME, version = APP_VERSION, "Logging initialised");
}
