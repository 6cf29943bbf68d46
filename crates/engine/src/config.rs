//! Engine configuration
//!
//! All tunable rates, bounds, and windows in one place. Defaults match the
//! production deployment: 2% transfer fee, 24h gift cooldown, 25% win
//! probability with double-or-nothing payout, 90% loan collateral and 25%
//! interest.

use chrono::Duration;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Transfer fee rate applied to the transferred amount
    pub fee_rate: Decimal,
    /// TTL after which a pending transfer request expires
    pub transfer_ttl: Duration,

    /// Bounds of the uniform daily-gift draw
    pub gift_min: Decimal,
    pub gift_max: Decimal,
    /// Rolling window between gift claims
    pub gift_cooldown: Duration,

    /// Accepted bet range
    pub min_bet: Decimal,
    pub max_bet: Decimal,
    /// Probability a wager draw wins (before the pool cap)
    pub win_probability: f64,

    /// Fraction of the loan amount the borrower must already hold
    pub collateral_ratio: Decimal,
    /// Interest rate charged on the principal
    pub interest_rate: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: Decimal::new(2, 2),         // 0.02
            transfer_ttl: Duration::minutes(15),
            gift_min: Decimal::new(5, 3),         // 0.005
            gift_max: Decimal::new(1, 2),         // 0.01
            gift_cooldown: Duration::hours(24),
            min_bet: Decimal::new(1, 2),          // 0.01
            max_bet: Decimal::new(100_000, 2),    // 1000.00
            win_probability: 0.25,
            collateral_ratio: Decimal::new(9, 1), // 0.9
            interest_rate: Decimal::new(25, 2),   // 0.25
        }
    }
}
