//! Payment record store tests
//!
//! The transactional check-then-insert and the UNIQUE constraint that backs it.

mod common;

use common::*;
use rusqlite::params;

#[test]
fn test_commit_once_inserts_then_reports_existing() {
    let env = TestEnv::new();
    let store = env.record_store();
    let id = Uuid::new_v4();

    let first = store.commit_once(&sample_event(id)).unwrap();
    let record = match first {
        CommitOutcome::Inserted(record) => record,
        other => panic!("expected Inserted, got {:?}", other),
    };
    assert_eq!(record.transaction_id, id);

    let second = store.commit_once(&sample_event(id)).unwrap();
    assert!(matches!(second, CommitOutcome::AlreadyCommitted));
    assert_eq!(env.count_payments(&id), 1);
}

#[test]
fn test_record_round_trips_all_fields() {
    let env = TestEnv::new();
    let id = Uuid::new_v4();
    let mut event = sample_event(id);
    event.status = PaymentStatus::Pending;
    event.currency = "BRL".to_string();
    event.observed_at = Some(
        chrono::DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc),
    );

    env.record_store().commit_once(&event).unwrap();

    let conn = env.db.get().unwrap();
    let stored = queries::get_payment_by_transaction_id(&conn, &id)
        .unwrap()
        .expect("record should exist");
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert_eq!(stored.currency, "BRL");
    assert_eq!(stored.observed_at, Some(1_714_566_600));
    assert!(stored.created_at > 0);
}

#[test]
fn test_get_payment_nonexistent() {
    let env = TestEnv::new();
    let conn = env.db.get().unwrap();

    let result = queries::get_payment_by_transaction_id(&conn, &Uuid::new_v4()).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_duplicate_insert_is_a_unique_violation() {
    let env = TestEnv::new();
    let conn = env.db.get().unwrap();
    let id = Uuid::new_v4();

    queries::create_payment(&conn, &sample_event(id)).unwrap();
    let err = queries::create_payment(&conn, &sample_event(id)).unwrap_err();

    match err {
        AppError::Database(ref e) => assert!(queries::is_unique_violation(e), "got {:?}", e),
        other => panic!("expected Database error, got {:?}", other),
    }
}

#[test]
fn test_unique_rejection_on_insert_reports_already_committed() {
    // Row written by a writer the in-transaction check never saw
    let env = TestEnv::new();
    let conn = env.db.get().unwrap();
    let id = Uuid::new_v4();
    queries::create_payment(&conn, &sample_event(id)).unwrap();

    let outcome = queries::insert_payment_once(&conn, &sample_event(id)).unwrap();

    assert!(matches!(outcome, CommitOutcome::AlreadyCommitted), "got {:?}", outcome);
    assert_eq!(env.count_payments(&id), 1);
}

#[test]
fn test_insert_once_propagates_other_constraint_failures() {
    let env = TestEnv::new();
    let conn = env.db.get().unwrap();
    let mut event = sample_event(Uuid::new_v4());
    event.amount = -1.0;

    let err = queries::insert_payment_once(&conn, &event).unwrap_err();

    assert!(matches!(err, AppError::Database(_)), "got {:?}", err);
    assert_eq!(queries::count_payments(&conn).unwrap(), 0);
}

#[test]
fn test_check_constraints_are_not_unique_violations() {
    let env = TestEnv::new();
    let conn = env.db.get().unwrap();

    let err = conn
        .execute(
            "INSERT INTO payments (id, transaction_id, status, amount, currency, created_at)
             VALUES ('pg_pay_x', 'tx', 'REFUNDED', 1.0, 'USD', 0)",
            params![],
        )
        .unwrap_err();

    assert!(!queries::is_unique_violation(&err));
}

#[test]
fn test_non_positive_amount_rejected_by_schema() {
    let env = TestEnv::new();
    let conn = env.db.get().unwrap();
    let mut event = sample_event(Uuid::new_v4());
    event.amount = 0.0;

    assert!(queries::create_payment(&conn, &event).is_err());
}

#[test]
fn test_failed_commit_leaves_nothing_behind() {
    let env = TestEnv::new();
    let store = env.record_store();
    let mut event = sample_event(Uuid::new_v4());
    event.currency = "EURO".to_string(); // violates CHECK(length = 3)

    assert!(store.commit_once(&event).is_err());

    let conn = env.db.get().unwrap();
    assert_eq!(queries::count_payments(&conn).unwrap(), 0);
}
