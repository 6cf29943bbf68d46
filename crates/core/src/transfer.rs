//! # Transfer Module
//!
//! The persisted transfer-request state machine. A request is created
//! `pending` and takes exactly one terminal transition: `settled`,
//! `cancelled`, or `expired`. Settlement itself (balance and pool movement)
//! lives in the engine; this module owns the states and the TTL rule.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Settled,
    Cancelled,
    Expired,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Settled => "settled",
            TransferStatus::Cancelled => "cancelled",
            TransferStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "settled" => Some(TransferStatus::Settled),
            "cancelled" => Some(TransferStatus::Cancelled),
            "expired" => Some(TransferStatus::Expired),
            _ => None,
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed, not-yet-settled transfer awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Unique transfer id (`tr_…`), exchanged between both sides
    pub id: String,
    pub sender_id: i64,
    pub recipient_id: i64,
    /// Amount the recipient receives, always positive
    pub amount: Decimal,
    /// Fee charged to the sender on top of `amount`
    pub fee: Decimal,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}

impl TransferRequest {
    pub fn new(
        id: &str,
        sender_id: i64,
        recipient_id: i64,
        amount: Decimal,
        fee: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            sender_id,
            recipient_id,
            amount,
            fee,
            status: TransferStatus::Pending,
            created_at,
        }
    }

    /// Total the sender pays on settlement.
    pub fn total_debit(&self) -> Decimal {
        self.amount + self.fee
    }

    /// Whether a still-pending request has outlived its TTL.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.status == TransferStatus::Pending && now - self.created_at > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(created_at: DateTime<Utc>) -> TransferRequest {
        TransferRequest::new("tr_1", 10, 20, dec!(50.00), dec!(1.00), created_at)
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TransferStatus::Pending,
            TransferStatus::Settled,
            TransferStatus::Cancelled,
            TransferStatus::Expired,
        ] {
            assert_eq!(TransferStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TransferStatus::from_str("done"), None);
    }

    #[test]
    fn test_only_pending_is_non_terminal() {
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(TransferStatus::Settled.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(TransferStatus::Expired.is_terminal());
    }

    #[test]
    fn test_total_debit() {
        let now = Utc::now();
        assert_eq!(request(now).total_debit(), dec!(51.00));
    }

    #[test]
    fn test_ttl_expiry() {
        let created = Utc::now();
        let ttl = Duration::minutes(15);
        let req = request(created);

        assert!(!req.is_expired(created + Duration::minutes(14), ttl));
        assert!(req.is_expired(created + Duration::minutes(16), ttl));

        // Terminal requests never re-expire
        let mut settled = request(created);
        settled.status = TransferStatus::Settled;
        assert!(!settled.is_expired(created + Duration::hours(1), ttl));
    }
}
