//! Ephemeral coordination store: a shared key/value facility with atomic
//! create-if-absent and per-key expiry.
//!
//! Knows nothing about payments. The idempotency guard builds its lock and
//! processed-marker primitives on top of this trait.

mod memory;
mod sqlite;

pub use memory::MemoryCoordinationStore;
pub use sqlite::SqliteCoordinationStore;

use std::time::Duration;

use crate::error::Result;

/// Key/value store with TTL semantics, shared by every processor instance.
///
/// Expired entries must behave exactly like absent ones for all operations.
pub trait CoordinationStore: Send + Sync {
    /// Atomically create `key` with `value` if no live entry exists.
    ///
    /// Returns `Ok(false)` when a live entry is already present. Among
    /// concurrent callers for the same key, at most one observes `Ok(true)`.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Create or overwrite `key`, resetting its expiry.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Whether a live entry exists for `key`. Never mutates.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}
