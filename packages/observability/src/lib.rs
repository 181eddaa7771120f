//! # Observability
//!
//! Logging setup shared by the check-in sync crates.
//!
//! Library crates only emit `tracing` events. Binaries call
//! [`init`] or [`init_with_config`] once at startup; everything after that
//! goes to:
//!
//! - a JSONL file, `~/.checkin-sync/logs/dev.jsonl` unless overridden, one
//!   flat object per event with `timestamp`, `level`, `target`, `message`
//!   and the event's own fields at the top level;
//! - optionally stderr, in compact human-readable form.
//!
//! `RUST_LOG` overrides the configured default level.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "checkin-sync".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod writer;

use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub use writer::{LogFileWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line.
    pub service_name: String,

    /// Default level filter (e.g., "debug", "info", "warn").
    /// Overridden by `RUST_LOG`.
    pub default_level: String,

    /// Custom log file path. Defaults to `~/.checkin-sync/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Default central log file location.
///
/// Falls back to the current directory when no home directory is known.
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".checkin-sync")
        .join("logs")
        .join("dev.jsonl")
}

/// Initialize logging with default settings for the named service.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// If the log file cannot be opened, file output is skipped and stderr is
/// used instead. Calling this twice is harmless: the second global
/// subscriber install fails silently.
pub fn init_with_config(config: LogConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let log_path = config.log_path.clone().unwrap_or_else(default_log_path);

    let (json_layer, file_error) = match LogFileWriter::new(&log_path) {
        Ok(writer) => {
            let layer = json_file_layer::<tracing_subscriber::Registry>(writer)
                .with_filter(env_filter(&config.default_level));
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    let stderr_layer = if config.also_stderr || file_error.is_some() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(std::io::stderr)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init();

    match file_error {
        None => tracing::info!(
            service = %config.service_name,
            log_path = %log_path.display(),
            "observability initialized"
        ),
        Some(e) => tracing::warn!(
            service = %config.service_name,
            log_path = %log_path.display(),
            error = %e,
            "log file unavailable, logging to stderr only"
        ),
    }
}

/// JSON lines into `writer`, event fields flattened next to the message.
fn json_file_layer<S>(writer: LogFileWriter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(true)
        .with_ansi(false)
        .with_writer(WriterFactory::new(writer))
}

fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};
