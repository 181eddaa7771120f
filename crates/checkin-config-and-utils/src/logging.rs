//! Logging initialization.
//!
//! Thin wrapper over the `observability` package so binaries configure
//! logging from a [`Paths`](crate::Paths) and a level string.

use crate::Paths;

/// Initialize logging for the `checkin-sync` service.
///
/// JSONL goes to `paths.log_file()`; `also_stderr` mirrors it in compact
/// form for foreground use. `RUST_LOG` overrides `level`.
pub fn init_logging(paths: &Paths, level: &str, also_stderr: bool) {
    observability::init_with_config(observability::LogConfig {
        service_name: "checkin-sync".into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr,
    });
}
