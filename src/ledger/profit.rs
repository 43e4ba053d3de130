//! Realized profit for a matched opening/closing pair.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::error::{LedgerError, Result};
use crate::models::Direction;

/// Round a monetary amount to cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes profit net of commissions.
pub struct ProfitCalculator;

impl ProfitCalculator {
    /// Unrounded profit of a round trip.
    ///
    /// Long: close - open - fees. Short: open - close - fees.
    pub fn compute(
        opening_value: Decimal,
        closing_value: Decimal,
        opening_commission: Decimal,
        closing_commission: Decimal,
        direction: Direction,
    ) -> Result<Decimal> {
        let (gain, cost) = match direction {
            Direction::Long => (closing_value, opening_value),
            Direction::Short => (opening_value, closing_value),
        };
        opening_commission
            .checked_add(closing_commission)
            .and_then(|fees| gain.checked_sub(cost)?.checked_sub(fees))
            .ok_or(LedgerError::Overflow("trade profit"))
    }

    /// Same as [`ProfitCalculator::compute`] for a textual direction.
    ///
    /// Labels other than `long`/`short` yield zero profit.
    pub fn compute_labeled(
        opening_value: Decimal,
        closing_value: Decimal,
        opening_commission: Decimal,
        closing_commission: Decimal,
        direction: &str,
    ) -> Result<Decimal> {
        match Direction::from_label(direction) {
            Some(direction) => Self::compute(
                opening_value,
                closing_value,
                opening_commission,
                closing_commission,
                direction,
            ),
            None => {
                warn!(direction = %direction, "Unknown trade direction, profit set to zero");
                Ok(Decimal::ZERO)
            }
        }
    }
}
