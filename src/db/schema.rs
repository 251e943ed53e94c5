use rusqlite::Connection;

/// Initialize the payments database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    // WAL lets readers proceed while one writer holds the lock
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        -- One row per distinct sender transaction. Never updated or deleted.
        -- UNIQUE(transaction_id) is the last line of defence against double commits.
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            transaction_id TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL CHECK (status IN ('COMPLETED', 'FAILED', 'PENDING')),
            amount REAL NOT NULL CHECK (amount > 0),
            currency TEXT NOT NULL CHECK (length(currency) = 3),
            observed_at INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payments_created ON payments(created_at);
        "#,
    )?;
    Ok(())
}

/// Initialize the coordination database schema (separate DB file)
///
/// Holds short-lived lock entries and processed markers. Rows are disposable:
/// expired rows behave as absent and are purged in the background.
pub fn init_coordination_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        CREATE TABLE IF NOT EXISTS coordination_keys (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at INTEGER NOT NULL  -- unix milliseconds
        );
        CREATE INDEX IF NOT EXISTS idx_coordination_keys_expiry ON coordination_keys(expires_at);
        "#,
    )?;
    Ok(())
}
