//! # Transaction Module
//!
//! Immutable transaction records. Every engine operation appends exactly the
//! records listed here and never updates or deletes them; replaying a user's
//! amounts in insertion order from zero yields the current balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of ledger movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Outgoing transfer; amount is `-(amount + fee)`
    TransferOut,
    /// Incoming transfer; amount is the transferred amount
    TransferIn,
    /// Daily gift credit
    DailyGift,
    /// Net wager win (`+bet`)
    WagerWin,
    /// Net wager loss (`-bet`)
    WagerLoss,
    /// Loan principal credited
    LoanIssue,
    /// Loan repayment debited (`-total_due`)
    LoanRepayment,
    /// Operator adjustment of the liquidity pool
    PoolAdjust,
}

impl TransactionKind {
    /// Stable string code stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::TransferOut => "transfer_out",
            TransactionKind::TransferIn => "transfer_in",
            TransactionKind::DailyGift => "daily_gift",
            TransactionKind::WagerWin => "wager_win",
            TransactionKind::WagerLoss => "wager_loss",
            TransactionKind::LoanIssue => "loan_issue",
            TransactionKind::LoanRepayment => "loan_repayment",
            TransactionKind::PoolAdjust => "pool_adjust",
        }
    }

    /// Parse from the database code.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "transfer_out" => Some(TransactionKind::TransferOut),
            "transfer_in" => Some(TransactionKind::TransferIn),
            "daily_gift" => Some(TransactionKind::DailyGift),
            "wager_win" => Some(TransactionKind::WagerWin),
            "wager_loss" => Some(TransactionKind::WagerLoss),
            "loan_issue" => Some(TransactionKind::LoanIssue),
            "loan_repayment" => Some(TransactionKind::LoanRepayment),
            "pool_adjust" => Some(TransactionKind::PoolAdjust),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific payload attached to a transaction.
///
/// Serialized as JSON in the store; absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// The other party of a transfer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<i64>,
    /// Transfer request this movement settles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<String>,
    /// Loan this movement issues or repays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<String>,
    /// Free-form operator note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransactionDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counterparty(mut self, user_id: i64) -> Self {
        self.counterparty = Some(user_id);
        self
    }

    pub fn with_transfer(mut self, transfer_id: &str) -> Self {
        self.transfer_id = Some(transfer_id.to_string());
        self
    }

    pub fn with_loan(mut self, loan_id: &str) -> Self {
        self.loan_id = Some(loan_id.to_string());
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One immutable ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id (`tx_…`)
    pub id: String,
    /// Account this record belongs to
    pub owner_id: i64,
    pub kind: TransactionKind,
    /// Signed amount; negative is a debit from the owner's perspective
    pub amount: Decimal,
    pub details: TransactionDetails,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: &str,
        owner_id: i64,
        kind: TransactionKind,
        amount: Decimal,
        details: TransactionDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            owner_id,
            kind,
            amount,
            details,
            created_at,
        }
    }

    /// Sender-side record of a settled transfer. `total` is `amount + fee`.
    pub fn transfer_out(
        id: &str,
        sender_id: i64,
        recipient_id: i64,
        total: Decimal,
        transfer_id: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            sender_id,
            TransactionKind::TransferOut,
            -total,
            TransactionDetails::new()
                .with_counterparty(recipient_id)
                .with_transfer(transfer_id),
            at,
        )
    }

    /// Recipient-side record of a settled transfer.
    pub fn transfer_in(
        id: &str,
        recipient_id: i64,
        sender_id: i64,
        amount: Decimal,
        transfer_id: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            recipient_id,
            TransactionKind::TransferIn,
            amount,
            TransactionDetails::new()
                .with_counterparty(sender_id)
                .with_transfer(transfer_id),
            at,
        )
    }

    pub fn daily_gift(id: &str, user_id: i64, amount: Decimal, at: DateTime<Utc>) -> Self {
        Self::new(
            id,
            user_id,
            TransactionKind::DailyGift,
            amount,
            TransactionDetails::new(),
            at,
        )
    }

    /// Wager settlement; `net` is `+bet` on a win, `-bet` on a loss.
    pub fn wager(id: &str, user_id: i64, won: bool, net: Decimal, at: DateTime<Utc>) -> Self {
        let kind = if won {
            TransactionKind::WagerWin
        } else {
            TransactionKind::WagerLoss
        };
        Self::new(id, user_id, kind, net, TransactionDetails::new(), at)
    }

    pub fn loan_issue(
        id: &str,
        borrower_id: i64,
        principal: Decimal,
        loan_id: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            borrower_id,
            TransactionKind::LoanIssue,
            principal,
            TransactionDetails::new().with_loan(loan_id),
            at,
        )
    }

    pub fn loan_repayment(
        id: &str,
        borrower_id: i64,
        total_due: Decimal,
        loan_id: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            borrower_id,
            TransactionKind::LoanRepayment,
            -total_due,
            TransactionDetails::new().with_loan(loan_id),
            at,
        )
    }

    pub fn pool_adjust(id: &str, delta: Decimal, note: &str, at: DateTime<Utc>) -> Self {
        Self::new(
            id,
            crate::account::SYSTEM_ACCOUNT,
            TransactionKind::PoolAdjust,
            delta,
            TransactionDetails::new().with_note(note),
            at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            TransactionKind::TransferOut,
            TransactionKind::TransferIn,
            TransactionKind::DailyGift,
            TransactionKind::WagerWin,
            TransactionKind::WagerLoss,
            TransactionKind::LoanIssue,
            TransactionKind::LoanRepayment,
            TransactionKind::PoolAdjust,
        ] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("trade"), None);
    }

    #[test]
    fn test_transfer_pair_shares_id_and_conserves() {
        let at = Utc::now();
        let out = Transaction::transfer_out("tx_1", 10, 20, dec!(51.00), "tr_abc", at);
        let inc = Transaction::transfer_in("tx_2", 20, 10, dec!(50.00), "tr_abc", at);

        assert_eq!(out.amount, dec!(-51.00));
        assert_eq!(inc.amount, dec!(50.00));
        assert_eq!(out.details.transfer_id, inc.details.transfer_id);
        assert_eq!(out.details.counterparty, Some(20));
        assert_eq!(inc.details.counterparty, Some(10));
        // Debit equals credit plus the 1.00 fee
        assert_eq!(-out.amount - inc.amount, dec!(1.00));
    }

    #[test]
    fn test_details_serialization_omits_empty_fields() {
        let details = TransactionDetails::new().with_counterparty(7);
        let json = serde_json::to_string(&details).unwrap();
        assert_eq!(json, r#"{"counterparty":7}"#);

        let parsed: TransactionDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, details);
    }

    #[test]
    fn test_wager_record_sign() {
        let at = Utc::now();
        let win = Transaction::wager("tx_w", 1, true, dec!(5), at);
        let loss = Transaction::wager("tx_l", 1, false, dec!(-5), at);
        assert_eq!(win.kind, TransactionKind::WagerWin);
        assert_eq!(loss.kind, TransactionKind::WagerLoss);
        assert!(win.amount > Decimal::ZERO);
        assert!(loss.amount < Decimal::ZERO);
    }
}
