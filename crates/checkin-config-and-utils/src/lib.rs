//! Configuration, paths, errors, and logging setup for check-in sync.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_LOG_LEVEL, DEFAULT_PROBE_INTERVAL_SECS, DEFAULT_QUEUE_KEY,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SUPABASE_ANON_KEY, DEFAULT_SUPABASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
