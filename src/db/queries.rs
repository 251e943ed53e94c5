use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::id::gen_payment_id;
use crate::models::*;

use super::from_row::{PAYMENT_COLS, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// True when `err` is a UNIQUE constraint rejection.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ============ Payments ============

pub fn get_payment_by_transaction_id(
    conn: &Connection,
    transaction_id: &Uuid,
) -> Result<Option<PaymentRecord>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE transaction_id = ?1", PAYMENT_COLS),
        &[&transaction_id.to_string()],
    )
}

pub fn count_payments_for_transaction(conn: &Connection, transaction_id: &Uuid) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE transaction_id = ?1",
        params![transaction_id.to_string()],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn count_payments(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM payments", [], |row| row.get(0))
        .map_err(Into::into)
}

/// Insert a payment row. Fails with a UNIQUE violation if the identity already exists.
pub fn create_payment(conn: &Connection, event: &PaymentEvent) -> Result<PaymentRecord> {
    let record = PaymentRecord {
        id: gen_payment_id(),
        transaction_id: event.transaction_id,
        status: event.status,
        amount: event.amount,
        currency: event.currency.clone(),
        observed_at: event.observed_at.map(|t| t.timestamp()),
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO payments (id, transaction_id, status, amount, currency, observed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &record.id,
            record.transaction_id.to_string(),
            record.status.as_str(),
            record.amount,
            &record.currency,
            record.observed_at,
            record.created_at,
        ],
    )?;

    Ok(record)
}

/// Write the event exactly once: existence check and insert in one atomic unit.
///
/// IMMEDIATE takes the write lock at BEGIN, so no other connection can insert
/// the same identity between the check and the insert. A UNIQUE rejection is
/// still mapped to `AlreadyCommitted` for writers outside this database's
/// locking (e.g. a replica promoted mid-flight).
pub fn commit_payment_once(conn: &mut Connection, event: &PaymentEvent) -> Result<CommitOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if get_payment_by_transaction_id(&tx, &event.transaction_id)?.is_some() {
        // Nothing written; dropping the transaction rolls back the empty unit
        return Ok(CommitOutcome::AlreadyCommitted);
    }

    let outcome = insert_payment_once(&tx, event)?;
    if matches!(outcome, CommitOutcome::Inserted(_)) {
        tx.commit()?;
    }
    Ok(outcome)
}

/// Insert the event, reporting a UNIQUE rejection as `AlreadyCommitted`.
///
/// Any other failure is returned unchanged.
pub fn insert_payment_once(conn: &Connection, event: &PaymentEvent) -> Result<CommitOutcome> {
    match create_payment(conn, event) {
        Ok(record) => Ok(CommitOutcome::Inserted(record)),
        Err(AppError::Database(ref e)) if is_unique_violation(e) => {
            tracing::debug!(
                transaction_id = %event.transaction_id,
                "Insert rejected by unique constraint"
            );
            Ok(CommitOutcome::AlreadyCommitted)
        }
        Err(e) => Err(e),
    }
}

// ============ Coordination Keys ============
//
// Expiry is stored in unix milliseconds. An expired row is treated as absent
// by every read and conditional write, whether or not it has been purged yet.

/// Create `key` only if no live entry exists. Returns whether this call created it.
pub fn try_insert_coordination_key(
    conn: &Connection,
    key: &str,
    value: &str,
    ttl: Duration,
) -> Result<bool> {
    let now = now_millis();
    let expires_at = now.saturating_add(ttl_millis(ttl));
    // Single statement: SQLite serialises writers, so exactly one caller sees a change
    let affected = conn.execute(
        "INSERT INTO coordination_keys (key, value, expires_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
         WHERE coordination_keys.expires_at <= ?4",
        params![key, value, expires_at, now],
    )?;
    Ok(affected > 0)
}

/// Create or overwrite `key` with a fresh expiry.
pub fn upsert_coordination_key(conn: &Connection, key: &str, value: &str, ttl: Duration) -> Result<()> {
    let expires_at = now_millis().saturating_add(ttl_millis(ttl));
    conn.execute(
        "INSERT INTO coordination_keys (key, value, expires_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        params![key, value, expires_at],
    )?;
    Ok(())
}

pub fn coordination_key_exists(conn: &Connection, key: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM coordination_keys WHERE key = ?1 AND expires_at > ?2",
            params![key, now_millis()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn delete_coordination_key(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM coordination_keys WHERE key = ?1", params![key])?;
    Ok(())
}

/// Delete expired entries. Returns the number of deleted rows.
pub fn purge_expired_coordination_keys(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM coordination_keys WHERE expires_at <= ?1",
        params![now_millis()],
    )?;
    Ok(deleted)
}
