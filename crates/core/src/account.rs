//! # Account Module
//!
//! A user account holds one balance in the ledger currency. Accounts are
//! upserted on first balance mutation and never deleted; the account id is
//! the numeric user id supplied by the chat platform.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reserved owner id for operator actions (pool funding).
pub const SYSTEM_ACCOUNT: i64 = 0;

/// Per-user ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Platform-supplied numeric user id
    pub user_id: i64,
    /// Current balance, never negative
    pub balance: Decimal,
    /// Timestamp of the last daily-gift claim, if any
    pub last_gift_at: Option<DateTime<Utc>>,
}

impl UserAccount {
    /// A fresh account with zero balance.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            balance: Decimal::ZERO,
            last_gift_at: None,
        }
    }

    /// Whether `amount` can be debited without going negative.
    pub fn can_spend(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Balance after applying a signed delta.
    ///
    /// # Returns
    /// - `Ok(new_balance)` when the result is non-negative
    /// - `Err(shortfall)` when the debit exceeds the balance
    pub fn apply(&self, delta: Decimal) -> Result<Decimal, Decimal> {
        let next = self.balance + delta;
        if next < Decimal::ZERO {
            Err(-next)
        } else {
            Ok(next)
        }
    }
}
