//! Loan subsystem
//!
//! Collateral-checked loans with fixed interest. Issuance credits the
//! principal immediately; repayment debits principal + interest in one
//! atomic step and flips the loan to paid exactly once. A user may hold
//! any number of concurrent unpaid loans.

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};
use crate::ledger::apply_delta_on;
use bankbot_core::{ids, interest_on, round_minor, Loan, Transaction};
use bankbot_persistence::{LoanRepo, TransactionRepo, UserRepo};
use rust_decimal::Decimal;
use tracing::info;

/// Result of a repayment.
#[derive(Debug, Clone)]
pub struct Repayment {
    pub loan: Loan,
    /// Borrower balance after the debit
    pub balance: Decimal,
}

/// Loan Subsystem service.
pub struct LoanService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LoanService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a loan. The borrower must already hold `collateral_ratio` of
    /// the requested amount; the principal is credited immediately.
    pub async fn issue(&self, user_id: i64, amount: Decimal) -> EngineResult<Loan> {
        let amount = round_minor(amount);
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(format!(
                "Loan amount must be positive: {}",
                amount
            )));
        }
        let config = self.ctx.config();

        let _guard = self.ctx.lock_writes().await;
        let now = self.ctx.now();
        let mut tx = self.ctx.pool().begin().await?;

        let balance = UserRepo::balance(&mut *tx, user_id).await?;
        let required = round_minor(amount * config.collateral_ratio);
        if balance < required {
            return Err(EngineError::InsufficientCollateral {
                required,
                available: balance,
            });
        }

        let interest = interest_on(amount, config.interest_rate);
        let loan = Loan::new(&ids::loan_id(), user_id, amount, interest, now);
        LoanRepo::insert(&mut *tx, &loan).await?;
        apply_delta_on(&mut tx, user_id, amount).await?;

        let record =
            Transaction::loan_issue(&ids::transaction_id(), user_id, amount, &loan.id, now);
        TransactionRepo::append(&mut *tx, &record).await?;
        tx.commit().await?;

        info!(
            user_id,
            loan_id = %loan.id,
            principal = %loan.principal,
            total_due = %loan.total_due,
            "loan issued"
        );
        Ok(loan)
    }

    /// Repay an unpaid loan in full.
    pub async fn repay(&self, loan_id: &str, user_id: i64) -> EngineResult<Repayment> {
        let _guard = self.ctx.lock_writes().await;
        let now = self.ctx.now();
        let mut tx = self.ctx.pool().begin().await?;

        let mut loan = LoanRepo::get_unpaid(&mut *tx, loan_id, user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Loan", loan_id))?;

        let balance = UserRepo::balance(&mut *tx, user_id).await?;
        if balance < loan.total_due {
            return Err(EngineError::InsufficientFunds {
                needed: loan.total_due,
                available: balance,
            });
        }

        if !LoanRepo::mark_paid(&mut *tx, loan_id, user_id).await? {
            // Raced with another repayment of the same loan
            return Err(EngineError::not_found("Loan", loan_id));
        }
        let balance = apply_delta_on(&mut tx, user_id, -loan.total_due).await?;

        let record = Transaction::loan_repayment(
            &ids::transaction_id(),
            user_id,
            loan.total_due,
            loan_id,
            now,
        );
        TransactionRepo::append(&mut *tx, &record).await?;
        tx.commit().await?;

        loan.paid = true;
        info!(user_id, loan_id, total_due = %loan.total_due, "loan repaid");
        Ok(Repayment { loan, balance })
    }

    /// All unpaid loans of one borrower, oldest first.
    pub async fn outstanding(&self, user_id: i64) -> EngineResult<Vec<Loan>> {
        Ok(LoanRepo::outstanding_for(self.ctx.pool(), user_id).await?)
    }
}
