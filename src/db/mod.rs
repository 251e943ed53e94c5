mod from_row;
mod schema;
pub mod queries;

pub use schema::{init_coordination_db, init_db};

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::crypto::WebhookSecret;
use crate::processor::PaymentProcessor;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Exactly-once protocol engine
    pub processor: Arc<PaymentProcessor>,
    /// Secret for the `X-Signature` HMAC
    pub webhook_secret: WebhookSecret,
}

/// Open a pooled SQLite database file.
///
/// Every connection waits up to five seconds for a competing writer instead of
/// failing immediately with `SQLITE_BUSY`.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
    Pool::builder().max_size(10).build(manager)
}
