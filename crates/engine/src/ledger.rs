//! Balance ledger
//!
//! Atomic debit/credit/pool primitives every higher-level operation builds
//! on, plus the transaction-log read API and pool reporting. The invariants
//! enforced here: no committed balance is ever negative, and a payout-class
//! pool adjustment never drives the pool negative.

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};
use bankbot_core::{ids, round_minor, Transaction, UserAccount};
use bankbot_persistence::{PoolRepo, TransactionRepo, UserRepo};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::info;

/// Apply a signed delta to a user balance inside an open transaction.
///
/// The check-then-write runs on the same connection as the final commit, so
/// under the context write lock no concurrent operation can interleave.
pub(crate) async fn apply_delta_on(
    conn: &mut SqliteConnection,
    user_id: i64,
    delta: Decimal,
) -> EngineResult<Decimal> {
    let account = match UserRepo::get(&mut *conn, user_id).await? {
        Some(row) => row.into_account()?,
        None => UserAccount::new(user_id),
    };
    let next = account.apply(delta).map_err(|_| EngineError::InsufficientFunds {
        needed: -delta,
        available: account.balance,
    })?;
    UserRepo::upsert_balance(&mut *conn, user_id, next).await?;
    Ok(next)
}

/// Adjust the pool inside an open transaction, recording a history sample.
///
/// `payout_class` adjustments are refused rather than allowed to drive the
/// pool negative; fee credits and operator funding pass unconditionally.
pub(crate) async fn adjust_pool_on(
    conn: &mut SqliteConnection,
    delta: Decimal,
    payout_class: bool,
    at: DateTime<Utc>,
) -> EngineResult<Decimal> {
    let current = PoolRepo::amount(&mut *conn).await?;
    let next = current + delta;
    if payout_class && next < Decimal::ZERO {
        return Err(EngineError::InsufficientPoolFunds {
            needed: -delta,
            available: current,
        });
    }
    PoolRepo::set_amount(&mut *conn, next).await?;
    PoolRepo::add_sample(&mut *conn, delta, next, at).await?;
    Ok(next)
}

/// Balance Ledger service - balances, pool, transaction history.
pub struct Ledger<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> Ledger<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Current balance; zero for users the ledger has never seen.
    pub async fn balance_of(&self, user_id: i64) -> EngineResult<Decimal> {
        Ok(UserRepo::balance(self.ctx.pool(), user_id).await?)
    }

    /// Atomically apply a signed delta and return the new balance.
    pub async fn apply_delta(&self, user_id: i64, delta: Decimal) -> EngineResult<Decimal> {
        let _guard = self.ctx.lock_writes().await;
        let mut tx = self.ctx.pool().begin().await?;
        let next = apply_delta_on(&mut tx, user_id, delta).await?;
        tx.commit().await?;
        Ok(next)
    }

    /// Atomically adjust the pool and return its new amount.
    pub async fn adjust_pool(&self, delta: Decimal, payout_class: bool) -> EngineResult<Decimal> {
        let _guard = self.ctx.lock_writes().await;
        let mut tx = self.ctx.pool().begin().await?;
        let next = adjust_pool_on(&mut tx, delta, payout_class, self.ctx.now()).await?;
        tx.commit().await?;
        Ok(next)
    }

    /// Operator funding of the pool, logged as a `pool_adjust` transaction
    /// on the system account so seeding shows up in the audit trail.
    pub async fn fund_pool(&self, amount: Decimal) -> EngineResult<Decimal> {
        let amount = round_minor(amount);
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(format!(
                "Pool funding must be positive: {}",
                amount
            )));
        }

        let _guard = self.ctx.lock_writes().await;
        let now = self.ctx.now();
        let mut tx = self.ctx.pool().begin().await?;

        let next = adjust_pool_on(&mut tx, amount, false, now).await?;
        let record =
            Transaction::pool_adjust(&ids::transaction_id(), amount, "operator funding", now);
        TransactionRepo::append(&mut *tx, &record).await?;

        tx.commit().await?;
        info!(%amount, pool = %next, "pool funded");
        Ok(next)
    }

    pub async fn pool_amount(&self) -> EngineResult<Decimal> {
        Ok(PoolRepo::amount(self.ctx.pool()).await?)
    }

    /// Sum of all user balances. Reporting only.
    pub async fn total_user_balance(&self) -> EngineResult<Decimal> {
        Ok(UserRepo::total_balance(self.ctx.pool()).await?)
    }

    /// Percentage change of pool liquidity over the last hour, from the
    /// history samples; zero when no sample is old enough or the base is 0.
    pub async fn pool_hourly_change(&self) -> EngineResult<Decimal> {
        let current = self.pool_amount().await?;
        let cutoff = self.ctx.now() - Duration::hours(1);
        let past = PoolRepo::amount_at_or_before(self.ctx.pool(), cutoff).await?;

        match past {
            Some(base) if base != Decimal::ZERO => {
                Ok(round_minor((current - base) / base * Decimal::ONE_HUNDRED))
            }
            _ => Ok(Decimal::ZERO),
        }
    }

    /// A user's full transaction history, insertion order ascending.
    pub async fn history_for(&self, user_id: i64) -> EngineResult<Vec<Transaction>> {
        Ok(TransactionRepo::history_for(self.ctx.pool(), user_id).await?)
    }

    /// Lookup one transaction by id.
    pub async fn transaction(&self, id: &str) -> EngineResult<Transaction> {
        TransactionRepo::get_by_id(self.ctx.pool(), id)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    EngineError::not_found("Transaction", id)
                } else {
                    err.into()
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::test_context;
    use crate::error::EngineError;
    use crate::ledger::Ledger;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_unknown_user_has_zero_balance() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);
        assert_eq!(ledger.balance_of(999).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_apply_delta_guards_negative() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);

        assert_eq!(ledger.apply_delta(1, dec!(100)).await.unwrap(), dec!(100));
        assert_eq!(ledger.apply_delta(1, dec!(-60)).await.unwrap(), dec!(40));

        let err = ledger.apply_delta(1, dec!(-40.01)).await.unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        // Failed debit left the balance untouched
        assert_eq!(ledger.balance_of(1).await.unwrap(), dec!(40));
    }

    #[tokio::test]
    async fn test_pool_payout_guard() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);

        ledger.adjust_pool(dec!(5), false).await.unwrap();
        let err = ledger.adjust_pool(dec!(-10), true).await.unwrap_err();
        assert!(matches!(err, EngineError::InsufficientPoolFunds { .. }));
        assert_eq!(ledger.pool_amount().await.unwrap(), dec!(5));

        // Non-payout adjustments may take the pool negative in principle
        assert_eq!(ledger.adjust_pool(dec!(-10), false).await.unwrap(), dec!(-5));
    }

    #[tokio::test]
    async fn test_fund_pool_logs_system_transaction() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);

        ledger.fund_pool(dec!(500)).await.unwrap();
        assert_eq!(ledger.pool_amount().await.unwrap(), dec!(500));

        let history = ledger.history_for(bankbot_core::SYSTEM_ACCOUNT).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, dec!(500));

        let err = ledger.fund_pool(dec!(0)).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_total_user_balance() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);

        ledger.apply_delta(1, dec!(10)).await.unwrap();
        ledger.apply_delta(2, dec!(20.50)).await.unwrap();
        assert_eq!(ledger.total_user_balance().await.unwrap(), dec!(30.50));
    }
}
