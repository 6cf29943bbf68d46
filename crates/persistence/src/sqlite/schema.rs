//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables, plus the conversions back
//! into domain types. Decimals are stored as TEXT so no precision is lost;
//! parsing failures surface as `StoreError::InvalidDecimal`.

use crate::error::{StoreError, StoreResult};
use bankbot_core::{
    Loan, Transaction, TransactionDetails, TransactionKind, TransferRequest, TransferStatus,
    UserAccount,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parse a TEXT decimal column.
pub(crate) fn parse_decimal(value: &str) -> StoreResult<Decimal> {
    Decimal::from_str(value).map_err(|_| StoreError::InvalidDecimal(value.to_string()))
}

/// Row type for the `users` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub user_id: i64,
    pub balance: String, // Decimal stored as TEXT
    pub last_gift_at: Option<DateTime<Utc>>,
}

impl UserRow {
    pub fn into_account(self) -> StoreResult<UserAccount> {
        Ok(UserAccount {
            user_id: self.user_id,
            balance: parse_decimal(&self.balance)?,
            last_gift_at: self.last_gift_at,
        })
    }
}

/// Row type for the `transactions` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Insertion order; canonical per-owner history order
    pub seq: i64,
    pub id: String,
    pub owner_id: i64,
    pub kind: String,
    pub amount: String, // Decimal stored as TEXT
    pub details: String, // JSON payload
    pub created_at: DateTime<Utc>,
}

impl TransactionRow {
    pub fn into_transaction(self) -> StoreResult<Transaction> {
        let kind = TransactionKind::from_str(&self.kind).ok_or_else(|| {
            StoreError::InvalidEnumValue {
                field: "transactions.kind".to_string(),
                value: self.kind.clone(),
            }
        })?;
        let details: TransactionDetails = serde_json::from_str(&self.details)?;
        Ok(Transaction {
            id: self.id,
            owner_id: self.owner_id,
            kind,
            amount: parse_decimal(&self.amount)?,
            details,
            created_at: self.created_at,
        })
    }
}

/// Row type for the `transfers` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransferRow {
    pub id: String,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub amount: String,
    pub fee: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TransferRow {
    pub fn into_request(self) -> StoreResult<TransferRequest> {
        let status = TransferStatus::from_str(&self.status).ok_or_else(|| {
            StoreError::InvalidEnumValue {
                field: "transfers.status".to_string(),
                value: self.status.clone(),
            }
        })?;
        Ok(TransferRequest {
            id: self.id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            amount: parse_decimal(&self.amount)?,
            fee: parse_decimal(&self.fee)?,
            status,
            created_at: self.created_at,
        })
    }
}

/// Row type for the `loans` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LoanRow {
    pub id: String,
    pub borrower_id: i64,
    pub principal: String,
    pub interest: String,
    pub total_due: String,
    pub paid: bool,
    pub issued_at: DateTime<Utc>,
}

impl LoanRow {
    pub fn into_loan(self) -> StoreResult<Loan> {
        Ok(Loan {
            id: self.id,
            borrower_id: self.borrower_id,
            principal: parse_decimal(&self.principal)?,
            interest: parse_decimal(&self.interest)?,
            total_due: parse_decimal(&self.total_due)?,
            paid: self.paid,
            issued_at: self.issued_at,
        })
    }
}

/// Row type for the singleton `pool` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PoolRow {
    pub id: i64,
    pub amount: String,
}

/// Row type for the `pool_history` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PoolSampleRow {
    pub seq: i64,
    pub delta: String,
    /// Pool amount right after the delta was applied
    pub amount_after: String,
    pub created_at: DateTime<Utc>,
}
