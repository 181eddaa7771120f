//! Local key-value persistence for the check-in offline queue.
//!
//! This crate provides:
//! - [`KeyValueStore`]: the string key/value contract the queue is built on
//! - [`SqliteKeyValueStore`]: durable store in a single SQLite file
//! - [`MemoryKeyValueStore`]: in-process store for tests and ephemeral use

mod error;
mod memory;
mod migrations;
mod sqlite;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryKeyValueStore;
pub use migrations::{run_migrations, CURRENT_VERSION};
pub use sqlite::SqliteKeyValueStore;
pub use traits::KeyValueStore;
