use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment status reported by the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Failed,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Pending => "PENDING",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "PENDING" => Ok(Self::Pending),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated, validated payment-status event.
///
/// `transaction_id` is the deduplication key: two events with the same
/// identity are the same logical event, whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub transaction_id: Uuid,
    pub status: PaymentStatus,
    pub amount: f64,
    /// ISO 4217 code, upper case
    pub currency: String,
    /// Sender-supplied timestamp. Advisory only: never used for ordering or dedup.
    pub observed_at: Option<DateTime<Utc>>,
}

/// A committed payment row. One per distinct `transaction_id`, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub transaction_id: Uuid,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    /// Unix seconds
    pub observed_at: Option<i64>,
    pub created_at: i64,
}

/// Result of the transactional write for one event.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// This call created the record
    Inserted(PaymentRecord),
    /// A record for the identity already existed (found by the in-transaction
    /// check, or rejected by the uniqueness constraint); nothing was written
    AlreadyCommitted,
}
