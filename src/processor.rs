//! Exactly-once processing of payment events.
//!
//! Protocol for one validated event:
//!
//! 1. Fast path: if the processed marker exists, answer `AlreadyProcessed`
//!    without taking the lock or touching the record store.
//! 2. Try to take the identity's lock. If another caller holds it, answer
//!    `Contended` with no side effects.
//! 3. Holding the lock: in one record-store transaction, check for an
//!    existing record and insert only if there is none; then write the
//!    processed marker.
//! 4. Release the lock exactly once on every exit path, then return or
//!    propagate the failure.
//!
//! The lock only saves work. Correctness rests on the in-transaction check
//! and the uniqueness constraint, which also hold when a lock TTL expires
//! under a slow holder and two critical sections overlap.

use std::sync::Arc;

use crate::error::Result;
use crate::idempotency::IdempotencyGuard;
use crate::models::{CommitOutcome, PaymentEvent};
use crate::records::RecordStore;

/// Which check recognised a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupSource {
    /// Processed marker hit before any lock was taken
    Marker,
    /// Record found inside the transaction (or the insert hit the constraint)
    Record,
}

/// Classification of a single `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// This call inserted the record
    Committed,
    /// The event had already been committed; nothing written
    AlreadyProcessed(DedupSource),
    /// Another call holds the critical section for this identity
    Contended,
}

impl ProcessOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

pub struct PaymentProcessor {
    guard: IdempotencyGuard,
    records: Arc<dyn RecordStore>,
}

impl PaymentProcessor {
    pub fn new(guard: IdempotencyGuard, records: Arc<dyn RecordStore>) -> Self {
        Self { guard, records }
    }

    /// Process one authenticated, validated event.
    ///
    /// Only store failures are returned as errors, and only after the lock
    /// (if taken) has been released.
    pub fn process(&self, event: &PaymentEvent) -> Result<ProcessOutcome> {
        let transaction_id = &event.transaction_id;

        if self.guard.is_processed(transaction_id)? {
            tracing::info!(%transaction_id, "Transaction already processed, returning success");
            return Ok(ProcessOutcome::AlreadyProcessed(DedupSource::Marker));
        }

        let Some(lease) = self.guard.try_lock(transaction_id)? else {
            tracing::warn!(%transaction_id, "Lock held by a concurrent request, ignoring");
            return Ok(ProcessOutcome::Contended);
        };

        // A panic in here still releases through the lease's Drop
        let result = self.critical_section(event);
        let released = lease.release();

        match (result, released) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) => {
                tracing::error!(%transaction_id, "Failed to release lock: {}", e);
                Err(e)
            }
            (Err(e), Ok(())) => {
                tracing::error!(%transaction_id, "Error processing transaction: {}", e);
                Err(e)
            }
            (Err(e), Err(release_err)) => {
                tracing::error!(%transaction_id, "Error processing transaction: {}", e);
                tracing::error!(%transaction_id, "Failed to release lock: {}", release_err);
                Err(e)
            }
        }
    }

    fn critical_section(&self, event: &PaymentEvent) -> Result<ProcessOutcome> {
        let transaction_id = &event.transaction_id;

        let outcome = match self.records.commit_once(event)? {
            CommitOutcome::Inserted(record) => {
                tracing::info!(%transaction_id, record_id = %record.id, "Transaction saved");
                ProcessOutcome::Committed
            }
            CommitOutcome::AlreadyCommitted => {
                tracing::info!(
                    %transaction_id,
                    "Transaction found during in-transaction check, processed marker was missing"
                );
                ProcessOutcome::AlreadyProcessed(DedupSource::Record)
            }
        };

        // Marker follows the commit, never precedes it
        self.guard.mark_processed(transaction_id)?;

        Ok(outcome)
    }
}
