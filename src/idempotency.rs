//! Idempotency guard: lock and processed-marker primitives over a
//! [`CoordinationStore`]. Contains no payment logic.
//!
//! Key layout:
//! - `lock:<transaction_id>`: sentinel, created only if absent, expires after the lock TTL
//! - `processed:<transaction_id>`: status token, expires after the retention TTL

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::coordination::CoordinationStore;
use crate::error::Result;

/// Upper bound on how long a crashed or hung holder can block retries.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_millis(10_000);

/// How long the processed marker answers the fast-path check (24 hours).
pub const DEFAULT_PROCESSED_TTL: Duration = Duration::from_secs(86_400);

const LOCK_SENTINEL: &str = "1";
const PROCESSED_VALUE: &str = "COMPLETED";

pub fn lock_key(transaction_id: &Uuid) -> String {
    format!("lock:{}", transaction_id)
}

pub fn processed_key(transaction_id: &Uuid) -> String {
    format!("processed:{}", transaction_id)
}

#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn CoordinationStore>,
    lock_ttl: Duration,
    processed_ttl: Duration,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self::with_ttls(store, DEFAULT_LOCK_TTL, DEFAULT_PROCESSED_TTL)
    }

    pub fn with_ttls(
        store: Arc<dyn CoordinationStore>,
        lock_ttl: Duration,
        processed_ttl: Duration,
    ) -> Self {
        Self {
            store,
            lock_ttl,
            processed_ttl,
        }
    }

    /// Try to take the lock. `Ok(false)` means someone else holds it; that is
    /// an expected outcome, not an error.
    pub fn acquire_lock(&self, transaction_id: &Uuid) -> Result<bool> {
        self.store
            .set_if_absent(&lock_key(transaction_id), LOCK_SENTINEL, self.lock_ttl)
    }

    /// Take the lock and wrap it in a lease that releases on every exit path.
    pub fn try_lock(&self, transaction_id: &Uuid) -> Result<Option<LockLease<'_>>> {
        if self.acquire_lock(transaction_id)? {
            Ok(Some(LockLease {
                guard: self,
                transaction_id: *transaction_id,
                released: false,
            }))
        } else {
            Ok(None)
        }
    }

    /// Fast-path check. `false` does not prove the event was never committed,
    /// only that the marker is absent (expired, or never written).
    pub fn is_processed(&self, transaction_id: &Uuid) -> Result<bool> {
        self.store.exists(&processed_key(transaction_id))
    }

    /// Write the processed marker. Only call after the record is durably committed.
    pub fn mark_processed(&self, transaction_id: &Uuid) -> Result<()> {
        self.store.set(
            &processed_key(transaction_id),
            PROCESSED_VALUE,
            self.processed_ttl,
        )
    }

    /// Delete the lock. Safe whether or not it is held or has already expired.
    pub fn release_lock(&self, transaction_id: &Uuid) -> Result<()> {
        self.store.delete(&lock_key(transaction_id))
    }
}

/// Scoped ownership of one identity's lock.
///
/// Call [`release`](Self::release) to release and observe the result. If the
/// lease is dropped without that (early return, `?`, panic), the lock is
/// released in `Drop` and any failure is logged; the TTL covers the rest.
pub struct LockLease<'a> {
    guard: &'a IdempotencyGuard,
    transaction_id: Uuid,
    released: bool,
}

impl LockLease<'_> {
    pub fn transaction_id(&self) -> &Uuid {
        &self.transaction_id
    }

    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.guard.release_lock(&self.transaction_id)
    }
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.guard.release_lock(&self.transaction_id) {
            tracing::error!(
                transaction_id = %self.transaction_id,
                "Failed to release lock (expires after TTL): {}",
                e
            );
        }
    }
}
