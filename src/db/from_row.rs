//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column via `FromStr`, converting parse errors to rusqlite errors.
///
/// Corrupt values surface as a query error instead of a panic.
fn parse_col<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

// ============ SQL SELECT Constants ============

pub const PAYMENT_COLS: &str =
    "id, transaction_id, status, amount, currency, observed_at, created_at";

// ============ FromRow Implementations ============

impl FromRow for PaymentRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PaymentRecord {
            id: row.get(0)?,
            transaction_id: parse_col(row, 1, "transaction_id")?,
            status: parse_col(row, 2, "status")?,
            amount: row.get(3)?,
            currency: row.get(4)?,
            observed_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
