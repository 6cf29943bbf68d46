//! # Money Module
//!
//! Decimal helpers for the single ledger currency. All amounts are
//! `rust_decimal::Decimal` so fee, interest, and reconciliation arithmetic
//! is exact; floats never touch a balance.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places of the currency's minor unit (cents).
pub const MINOR_UNIT: u32 = 2;

/// Round an amount to the currency's minor unit.
///
/// Midpoint rounds away from zero, so a 0.025 fee becomes 0.03 for a debit
/// and -0.025 becomes -0.03 for a credit reversal.
pub fn round_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT, RoundingStrategy::MidpointAwayFromZero)
}

/// Transfer fee for `amount` at `rate`, rounded to the minor unit.
pub fn fee_for(amount: Decimal, rate: Decimal) -> Decimal {
    round_minor(amount * rate)
}

/// Loan interest on `principal` at `rate`, rounded to the minor unit.
pub fn interest_on(principal: Decimal, rate: Decimal) -> Decimal {
    round_minor(principal * rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_minor() {
        assert_eq!(round_minor(dec!(1.005)), dec!(1.01));
        assert_eq!(round_minor(dec!(1.004)), dec!(1.00));
        assert_eq!(round_minor(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_minor(dec!(49.00)), dec!(49.00));
    }

    #[test]
    fn test_fee_for() {
        // 2% of 50.00 is exactly 1.00
        assert_eq!(fee_for(dec!(50.00), dec!(0.02)), dec!(1.00));
        // 2% of 0.99 is 0.0198, rounds to 0.02
        assert_eq!(fee_for(dec!(0.99), dec!(0.02)), dec!(0.02));
    }

    #[test]
    fn test_interest_on() {
        assert_eq!(interest_on(dec!(25), dec!(0.25)), dec!(6.25));
        assert_eq!(interest_on(dec!(100), dec!(0.25)), dec!(25.00));
    }
}
