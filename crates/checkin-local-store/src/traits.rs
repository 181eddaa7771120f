//! Storage trait definitions.

use crate::StoreResult;

/// String key/value storage scoped to one local origin.
///
/// Values survive process restarts for durable backends. Every method is
/// synchronous; callers that need read-modify-write atomicity hold their
/// own lock around the sequence.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a value. Returns whether it existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Check if a key exists.
    fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
