//! # Loan Module
//!
//! Collateral-checked loans. A loan is created unpaid with `total_due =
//! principal + interest` and is mutated exactly once, on repayment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Unique loan id (`ln_…`)
    pub id: String,
    pub borrower_id: i64,
    pub principal: Decimal,
    pub interest: Decimal,
    /// `principal + interest`, fixed at issuance
    pub total_due: Decimal,
    pub paid: bool,
    pub issued_at: DateTime<Utc>,
}

impl Loan {
    pub fn new(
        id: &str,
        borrower_id: i64,
        principal: Decimal,
        interest: Decimal,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            borrower_id,
            principal,
            interest,
            total_due: principal + interest,
            paid: false,
            issued_at,
        }
    }
}
