//! Durable record store: the system of record for committed payments.

use crate::db::{DbPool, queries};
use crate::error::Result;
use crate::models::{CommitOutcome, PaymentEvent};

/// Transactional store with a uniqueness constraint on the event identity.
pub trait RecordStore: Send + Sync {
    /// In one atomic unit: look for an existing record for the identity and,
    /// only if none exists, insert one.
    ///
    /// A uniqueness-constraint rejection must be reported as
    /// `AlreadyCommitted`, never as an error. Any other failure is returned
    /// unchanged and leaves nothing written.
    fn commit_once(&self, event: &PaymentEvent) -> Result<CommitOutcome>;
}

/// SQLite-backed record store.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: DbPool,
}

impl SqliteRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for SqliteRecordStore {
    fn commit_once(&self, event: &PaymentEvent) -> Result<CommitOutcome> {
        let mut conn = self.pool.get()?;
        queries::commit_payment_once(&mut conn, event)
    }
}
