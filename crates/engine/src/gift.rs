//! Gift cooldown tracker
//!
//! One random credit per rolling 24-hour window per user. The window is a
//! strict duration measured from the previous claim, not a calendar-day
//! comparison, so behaviour is identical at any hour.

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};
use crate::ledger::apply_delta_on;
use bankbot_core::{ids, Transaction};
use bankbot_persistence::{TransactionRepo, UserRepo};
use rust_decimal::Decimal;
use tracing::info;

/// Decimal places kept on the drawn gift amount.
const GIFT_PRECISION: u32 = 3;

/// Result of a successful claim.
#[derive(Debug, Clone)]
pub struct GiftClaim {
    pub amount: Decimal,
    pub balance: Decimal,
}

/// Gift Cooldown Tracker service.
pub struct GiftService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GiftService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Claim the daily gift: draws a uniform amount in the configured
    /// range, credits it, stamps the claim time, and logs it — atomically.
    pub async fn claim(&self, user_id: i64) -> EngineResult<GiftClaim> {
        let _guard = self.ctx.lock_writes().await;
        let now = self.ctx.now();
        let config = self.ctx.config();
        let mut tx = self.ctx.pool().begin().await?;

        if let Some(row) = UserRepo::get(&mut *tx, user_id).await? {
            let account = row.into_account()?;
            if let Some(last) = account.last_gift_at {
                let elapsed = now - last;
                if elapsed < config.gift_cooldown {
                    let retry_after = config.gift_cooldown - elapsed;
                    return Err(EngineError::CooldownActive {
                        retry_after_secs: retry_after.num_seconds().max(1),
                    });
                }
            }
        }

        let amount = self.draw_amount();
        let balance = apply_delta_on(&mut tx, user_id, amount).await?;
        UserRepo::stamp_gift(&mut *tx, user_id, now).await?;

        let record = Transaction::daily_gift(&ids::transaction_id(), user_id, amount, now);
        TransactionRepo::append(&mut *tx, &record).await?;
        tx.commit().await?;

        info!(user_id, amount = %amount, "daily gift claimed");
        Ok(GiftClaim { amount, balance })
    }

    /// Uniform draw in `[gift_min, gift_max]`, kept to gift precision.
    fn draw_amount(&self) -> Decimal {
        let config = self.ctx.config();
        let span = config.gift_max - config.gift_min;
        let unit = Decimal::try_from(self.ctx.random_unit()).unwrap_or(Decimal::ZERO);
        (config.gift_min + span * unit).round_dp(GIFT_PRECISION)
    }
}
