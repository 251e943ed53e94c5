use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::CoordinationStore;
use crate::error::{AppError, Result};

#[derive(Debug)]
struct Entry {
    /// `None` when the TTL is too large to represent; such an entry never expires
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(now: Instant, ttl: Duration) -> Self {
        Self {
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process coordination store.
///
/// Only coordinates callers inside one process; use
/// [`SqliteCoordinationStore`](super::SqliteCoordinationStore) when several
/// processes share the work. Values are never read back, so only expiry is
/// kept. Expired entries are evicted on every write.
#[derive(Debug, Default)]
pub struct MemoryCoordinationStore {
    entries: Mutex<HashMap<String, Entry>>,
}

type Entries = HashMap<String, Entry>;

impl MemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Coordination("memory store mutex poisoned".into()))
    }
}

fn evict_expired(entries: &mut Entries, now: Instant) {
    entries.retain(|_, e| e.is_live(now));
}

impl CoordinationStore for MemoryCoordinationStore {
    fn set_if_absent(&self, key: &str, _value: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        evict_expired(&mut entries, now);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(now, ttl));
        Ok(true)
    }

    fn set(&self, key: &str, _value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        evict_expired(&mut entries, now);
        entries.insert(key.to_string(), Entry::new(now, ttl));
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.lock()?;
        let now = Instant::now();
        Ok(entries.get(key).is_some_and(|e| e.is_live(now)))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
