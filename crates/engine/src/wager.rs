//! Wager settlement
//!
//! Double-or-nothing wagers against pool liquidity. The draw wins with the
//! configured probability, but a win whose payout exceeds the pool is
//! downgraded to a loss: the pool cap is a deterministic override of the
//! random outcome, never a second draw.

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{adjust_pool_on, apply_delta_on};
use bankbot_core::{ids, round_minor, Transaction};
use bankbot_persistence::{PoolRepo, TransactionRepo, UserRepo};
use rust_decimal::Decimal;
use tracing::info;

/// Result of one play.
#[derive(Debug, Clone)]
pub struct WagerOutcome {
    pub won: bool,
    /// True when a winning draw was overridden to protect pool solvency
    pub capped_by_pool: bool,
    /// Signed net ledger movement: `+bet` on a win, `-bet` on a loss
    pub net: Decimal,
    /// User balance after settlement
    pub balance: Decimal,
    /// Pool amount after settlement
    pub pool: Decimal,
}

/// Wager Settlement service.
pub struct WagerService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WagerService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Play one wager of `bet`.
    pub async fn play(&self, user_id: i64, bet: Decimal) -> EngineResult<WagerOutcome> {
        let config = self.ctx.config();
        let bet = round_minor(bet);
        if bet < config.min_bet || bet > config.max_bet {
            return Err(EngineError::InvalidBet {
                min: config.min_bet,
                max: config.max_bet,
            });
        }

        let _guard = self.ctx.lock_writes().await;
        let now = self.ctx.now();
        let mut tx = self.ctx.pool().begin().await?;

        let balance = UserRepo::balance(&mut *tx, user_id).await?;
        if bet > balance {
            return Err(EngineError::InsufficientFunds {
                needed: bet,
                available: balance,
            });
        }

        let pool = PoolRepo::amount(&mut *tx).await?;
        let drew_win = self.ctx.random_win(config.win_probability);
        let payout = bet * Decimal::TWO;
        let capped_by_pool = drew_win && payout > pool;
        let won = drew_win && !capped_by_pool;

        let net = if won { bet } else { -bet };
        let balance = apply_delta_on(&mut tx, user_id, net).await?;
        // The pool moves opposite the user; a win is payout-class.
        let pool = adjust_pool_on(&mut tx, -net, won, now).await?;

        let record = Transaction::wager(&ids::transaction_id(), user_id, won, net, now);
        TransactionRepo::append(&mut *tx, &record).await?;
        tx.commit().await?;

        info!(user_id, %bet, won, capped_by_pool, "wager settled");
        Ok(WagerOutcome {
            won,
            capped_by_pool,
            net,
            balance,
            pool,
        })
    }
}
