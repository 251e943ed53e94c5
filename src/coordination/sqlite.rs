use std::time::Duration;

use super::CoordinationStore;
use crate::db::{DbPool, queries};
use crate::error::Result;

/// Coordination store backed by a SQLite file.
///
/// Every process that opens the same file shares the same locks and
/// markers; SQLite's single-writer lock makes each conditional create atomic
/// across all of them.
#[derive(Clone)]
pub struct SqliteCoordinationStore {
    pool: DbPool,
}

impl SqliteCoordinationStore {
    /// Wrap a pool whose schema was initialised with
    /// [`init_coordination_db`](crate::db::init_coordination_db).
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Delete expired rows. Expired rows are already invisible; this only reclaims space.
    pub fn purge_expired(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        queries::purge_expired_coordination_keys(&conn)
    }
}

impl CoordinationStore for SqliteCoordinationStore {
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::try_insert_coordination_key(&conn, key, value, ttl)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let conn = self.pool.get()?;
        queries::upsert_coordination_key(&conn, key, value, ttl)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::coordination_key_exists(&conn, key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.pool.get()?;
        queries::delete_coordination_key(&conn, key)
    }
}
