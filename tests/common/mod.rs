//! Test utilities and fixtures for Payguard integration tests

#![allow(dead_code)]

use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub use payguard::coordination::{CoordinationStore, MemoryCoordinationStore, SqliteCoordinationStore};
pub use payguard::crypto::WebhookSecret;
pub use payguard::db::{AppState, DbPool, create_pool, init_coordination_db, init_db, queries};
pub use payguard::error::{AppError, Result};
pub use payguard::idempotency::{IdempotencyGuard, lock_key, processed_key};
pub use payguard::models::*;
pub use payguard::processor::{DedupSource, PaymentProcessor, ProcessOutcome};
pub use payguard::records::{RecordStore, SqliteRecordStore};
pub use uuid::Uuid;

pub const TEST_SECRET: &str = "super_secret_signing_key_for_tests";

/// File-backed databases in a private temp dir.
///
/// In-memory SQLite databases are per-connection, so anything that spans
/// threads or pools needs real files.
pub struct TestEnv {
    pub dir: TempDir,
    pub db: DbPool,
    pub coordination_db: DbPool,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = open_payments_pool(&dir);
        let coordination_db = open_coordination_pool(&dir);
        Self {
            dir,
            db,
            coordination_db,
        }
    }

    pub fn payments_path(&self) -> String {
        self.dir.path().join("payments.db").to_string_lossy().into_owned()
    }

    pub fn coordination_path(&self) -> String {
        self.dir.path().join("coordination.db").to_string_lossy().into_owned()
    }

    pub fn coordination_store(&self) -> SqliteCoordinationStore {
        SqliteCoordinationStore::new(self.coordination_db.clone())
    }

    pub fn record_store(&self) -> SqliteRecordStore {
        SqliteRecordStore::new(self.db.clone())
    }

    pub fn guard(&self) -> IdempotencyGuard {
        IdempotencyGuard::new(Arc::new(self.coordination_store()))
    }

    pub fn processor(&self) -> PaymentProcessor {
        PaymentProcessor::new(self.guard(), Arc::new(self.record_store()))
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            processor: Arc::new(self.processor()),
            webhook_secret: WebhookSecret::new(TEST_SECRET),
        }
    }

    pub fn count_payments(&self, transaction_id: &Uuid) -> i64 {
        let conn = self.db.get().unwrap();
        queries::count_payments_for_transaction(&conn, transaction_id).unwrap()
    }
}

fn open_payments_pool(dir: &TempDir) -> DbPool {
    let path = dir.path().join("payments.db");
    let pool = create_pool(path.to_str().unwrap()).expect("Failed to create pool");
    init_db(&pool.get().unwrap()).expect("Failed to initialize schema");
    pool
}

fn open_coordination_pool(dir: &TempDir) -> DbPool {
    let path = dir.path().join("coordination.db");
    let pool = create_pool(path.to_str().unwrap()).expect("Failed to create pool");
    init_coordination_db(&pool.get().unwrap()).expect("Failed to initialize coordination schema");
    pool
}

pub fn sample_event(transaction_id: Uuid) -> PaymentEvent {
    PaymentEvent {
        transaction_id,
        status: PaymentStatus::Completed,
        amount: 100.50,
        currency: "USD".to_string(),
        observed_at: None,
    }
}

pub fn sample_body(transaction_id: Uuid) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "transaction_id": transaction_id.to_string(),
        "status": "COMPLETED",
        "amount": 100.50,
        "currency": "BRL",
        "timestamp": "2024-05-01T12:30:00Z",
    }))
    .unwrap()
}

pub fn sign(body: &[u8]) -> String {
    WebhookSecret::new(TEST_SECRET).sign(body).unwrap()
}

pub fn webhook_app(state: AppState) -> Router {
    payguard::handlers::router().with_state(state)
}

// ============ Fault Injection ============

/// Wraps a coordination store and records every call.
pub struct RecordingStore<S> {
    pub inner: S,
    pub calls: Mutex<Vec<String>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl<S: CoordinationStore> CoordinationStore for RecordingStore<S> {
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.record(format!("set_if_absent {}", key));
        self.inner.set_if_absent(key, value, ttl)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.record(format!("set {}", key));
        self.inner.set(key, value, ttl)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.record(format!("exists {}", key));
        self.inner.exists(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.record(format!("delete {}", key));
        self.inner.delete(key)
    }
}

/// Coordination store whose writes (`set`) or deletes can be made to fail.
pub struct FlakyCoordinationStore {
    pub inner: MemoryCoordinationStore,
    pub fail_set: bool,
    pub fail_delete: bool,
    pub fail_exists: bool,
}

impl FlakyCoordinationStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryCoordinationStore::new(),
            fail_set: false,
            fail_delete: false,
            fail_exists: false,
        }
    }

    fn unavailable() -> AppError {
        AppError::Coordination("connection refused".into())
    }
}

impl CoordinationStore for FlakyCoordinationStore {
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.inner.set_if_absent(key, value, ttl)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if self.fail_set {
            return Err(Self::unavailable());
        }
        self.inner.set(key, value, ttl)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        if self.fail_exists {
            return Err(Self::unavailable());
        }
        self.inner.exists(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.fail_delete {
            return Err(Self::unavailable());
        }
        self.inner.delete(key)
    }
}

/// Record store that fails every call, simulating lost connectivity.
pub struct UnavailableRecordStore {
    pub attempts: AtomicUsize,
}

impl UnavailableRecordStore {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl RecordStore for UnavailableRecordStore {
    fn commit_once(&self, _event: &PaymentEvent) -> Result<CommitOutcome> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Internal("database connection lost".into()))
    }
}

/// Record store that sleeps before delegating, to stretch the critical section.
pub struct SlowRecordStore<R> {
    pub inner: R,
    pub delay: Duration,
}

impl<R: RecordStore> RecordStore for SlowRecordStore<R> {
    fn commit_once(&self, event: &PaymentEvent) -> Result<CommitOutcome> {
        std::thread::sleep(self.delay);
        self.inner.commit_once(event)
    }
}
