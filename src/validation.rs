//! Webhook payload shape and field rules.
//!
//! Every field is parsed as a raw JSON value so that missing or mistyped
//! fields are reported together with rule violations, not as a single
//! deserialization failure. Only syntactically broken JSON is a parse error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{PaymentEvent, PaymentStatus};

/// Raw webhook body, as sent on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub transaction_id: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// Required string field, or the issue describing why it is unusable.
fn required_str<'a>(value: &'a Option<Value>, field: &str) -> std::result::Result<&'a str, String> {
    match value {
        None => Err(format!("{}: is required", field)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(format!("{}: must be a string", field)),
    }
}

impl WebhookPayload {
    /// Parse raw bytes (already authenticated) into a payload.
    ///
    /// Fails only when the body is not well-formed JSON or has the wrong top-level shape.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Apply the field rules, producing a typed event or the full list of issues.
    pub fn validate(self) -> Result<PaymentEvent> {
        let mut issues = Vec::new();

        let transaction_id = match required_str(&self.transaction_id, "transaction_id") {
            Ok(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    issues.push("transaction_id: must be a UUID".to_string());
                    None
                }
            },
            Err(issue) => {
                issues.push(issue);
                None
            }
        };

        let status = match required_str(&self.status, "status") {
            Ok(raw) => match raw.parse::<PaymentStatus>() {
                Ok(s) => Some(s),
                Err(()) => {
                    issues.push("status: must be one of COMPLETED, FAILED, PENDING".to_string());
                    None
                }
            },
            Err(issue) => {
                issues.push(issue);
                None
            }
        };

        let amount = match &self.amount {
            None => {
                issues.push("amount: is required".to_string());
                None
            }
            Some(v) => match v.as_f64() {
                Some(n) if n.is_finite() && n > 0.0 => Some(n),
                Some(_) => {
                    issues.push("amount: must be a positive number".to_string());
                    None
                }
                None => {
                    issues.push("amount: must be a number".to_string());
                    None
                }
            },
        };

        let currency = match required_str(&self.currency, "currency") {
            Ok(raw) if raw.chars().count() == 3 => Some(raw.to_ascii_uppercase()),
            Ok(_) => {
                issues.push("currency: must be exactly 3 characters".to_string());
                None
            }
            Err(issue) => {
                issues.push(issue);
                None
            }
        };

        let observed_at = match &self.timestamp {
            None | Some(Value::Null) => None,
            Some(Value::String(ts)) => match DateTime::parse_from_rfc3339(ts) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(_) => {
                    issues.push("timestamp: must be an RFC 3339 datetime".to_string());
                    None
                }
            },
            Some(_) => {
                issues.push("timestamp: must be a string".to_string());
                None
            }
        };

        match (transaction_id, status, amount, currency) {
            (Some(transaction_id), Some(status), Some(amount), Some(currency))
                if issues.is_empty() =>
            {
                Ok(PaymentEvent {
                    transaction_id,
                    status,
                    amount,
                    currency,
                    observed_at,
                })
            }
            _ => Err(AppError::InvalidPayload(issues)),
        }
    }
}
