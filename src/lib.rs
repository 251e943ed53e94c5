//! Payguard - exactly-once processing of payment-status webhooks
//!
//! Senders deliver at least once and may deliver the same event concurrently.
//! This crate commits each distinct event to the system of record exactly once
//! and gives every duplicate a deterministic, non-committing answer.

pub mod config;
pub mod coordination;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod id;
pub mod idempotency;
pub mod models;
pub mod processor;
pub mod records;
pub mod validation;
