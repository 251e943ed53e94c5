//! Prefixed ID generation for stored payment records.
//!
//! Record IDs use a `pg_` brand prefix so they can never be confused with the
//! sender's own transaction identifiers (plain hyphenated UUIDs).
//!
//! Format: `pg_pay_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

pub const PAYMENT_PREFIX: &str = "pg_pay_";

/// Generates a new payment record ID.
pub fn gen_payment_id() -> String {
    format!("{}{}", PAYMENT_PREFIX, Uuid::new_v4().as_simple())
}

/// Cheap format check: `pg_pay_` followed by exactly 32 hex characters.
pub fn is_valid_payment_id(s: &str) -> bool {
    let Some(hex_part) = s.strip_prefix(PAYMENT_PREFIX) else {
        return false;
    };
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}
