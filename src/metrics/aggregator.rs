//! Reduces closed trades into portfolio metrics: profit factor, net return, return %.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};
use crate::ledger::round_cents;
use crate::models::{ClosedTrade, MetricsReport};

pub const DEFAULT_STARTING_CAPITAL: Decimal = dec!(100000);

/// Aggregator for portfolio-level statistics.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    starting_capital: Decimal,
}

impl MetricsAggregator {
    pub fn new(starting_capital: Decimal) -> Result<Self> {
        if starting_capital <= Decimal::ZERO {
            return Err(LedgerError::InvalidConfig(format!(
                "starting capital must be positive, got {}",
                starting_capital
            )));
        }
        Ok(Self { starting_capital })
    }

    pub fn starting_capital(&self) -> Decimal {
        self.starting_capital
    }

    /// Compute metrics for a batch of closed trades.
    ///
    /// Break-even trades land in the loss bucket. With no losses at all both
    /// the profit factor and the net return are infinite, and so is the
    /// return percentage derived from the latter. Fails only when a gross
    /// total leaves the `Decimal` range.
    pub fn aggregate(&self, trades: &[ClosedTrade]) -> Result<MetricsReport> {
        let (wins, losses): (Vec<&ClosedTrade>, Vec<&ClosedTrade>) =
            trades.iter().partition(|t| t.is_winner());

        let gross_profit = checked_sum(&wins, "gross profit")?;
        let gross_loss = checked_sum(&losses, "gross loss")?;

        let profit_factor = if gross_loss.abs() > Decimal::ZERO {
            ratio(gross_profit, gross_loss.abs())
        } else {
            f64::INFINITY
        };

        // Infinite whenever the loss total is exactly zero, even though the
        // difference itself would be defined.
        let net_return = if gross_loss != Decimal::ZERO {
            let net = gross_profit
                .checked_sub(gross_loss.abs())
                .ok_or(LedgerError::Overflow("net return"))?;
            Some(net)
        } else {
            None
        };

        let return_percent = match net_return {
            Some(net) => ratio(net, self.starting_capital),
            None => f64::INFINITY,
        };

        debug!(
            trades = trades.len(),
            gross_profit = %gross_profit,
            gross_loss = %gross_loss,
            "Computed portfolio metrics"
        );

        Ok(MetricsReport {
            profit_factor,
            net_return: net_return.map(to_metric).unwrap_or(f64::INFINITY),
            return_percent,
            gross_profit,
            gross_loss,
            winning_trades: wins.len() as u32,
            losing_trades: losses.len() as u32,
        })
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self {
            starting_capital: DEFAULT_STARTING_CAPITAL,
        }
    }
}

fn to_metric(value: Decimal) -> f64 {
    round_cents(value).to_f64().unwrap_or(0.0)
}

fn checked_sum(trades: &[&ClosedTrade], what: &'static str) -> Result<Decimal> {
    trades.iter().try_fold(Decimal::ZERO, |total, t| {
        total.checked_add(t.profit).ok_or(LedgerError::Overflow(what))
    })
}

/// Quotient rounded to cents; computed in `f64` when it exceeds `Decimal`.
fn ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    match numerator.checked_div(denominator) {
        Some(quotient) => to_metric(quotient),
        None => {
            warn!(numerator = %numerator, denominator = %denominator, "Ratio exceeds decimal range");
            let quotient = numerator.to_f64().unwrap_or(0.0) / denominator.to_f64().unwrap_or(1.0);
            (quotient * 100.0).round() / 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn make_trade(id: u32, profit: Decimal) -> ClosedTrade {
        ClosedTrade {
            sequence_id: id,
            direction: Direction::Long,
            open_order: format!("o{}", id),
            close_order: format!("c{}", id),
            open_timestamp: "t0".to_string(),
            close_timestamp: "t1".to_string(),
            open_value: Decimal::ZERO,
            close_value: profit,
            profit,
        }
    }

    fn trades(profits: &[Decimal]) -> Vec<ClosedTrade> {
        profits
            .iter()
            .enumerate()
            .map(|(i, p)| make_trade(i as u32 + 1, *p))
            .collect()
    }

    #[test]
    fn test_normal_case() {
        let metrics = MetricsAggregator::default().aggregate(&trades(&[dec!(100), dec!(-40), dec!(25)])).unwrap();

        assert_eq!(metrics.gross_profit, dec!(125));
        assert_eq!(metrics.gross_loss, dec!(-40));
        assert!((metrics.profit_factor - 3.13).abs() < 1e-9);
        assert_eq!(metrics.net_return, 85.0);
        assert_eq!(metrics.return_percent, 0.0);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 1);
    }

    #[test]
    fn test_empty_batch_is_infinite() {
        let metrics = MetricsAggregator::default().aggregate(&[]).unwrap();

        assert_eq!(metrics.profit_factor, f64::INFINITY);
        assert_eq!(metrics.net_return, f64::INFINITY);
        assert_eq!(metrics.return_percent, f64::INFINITY);
        assert_eq!(metrics.total_trades(), 0);
        assert_eq!(metrics.win_rate(), 0.0);
    }

    #[test]
    fn test_no_losses_gives_infinite_net_return() {
        // gross_profit - 0 would be well defined; the infinite result is intended.
        let metrics = MetricsAggregator::default().aggregate(&trades(&[dec!(100), dec!(50)])).unwrap();

        assert_eq!(metrics.gross_profit, dec!(150));
        assert_eq!(metrics.profit_factor, f64::INFINITY);
        assert_eq!(metrics.net_return, f64::INFINITY);
        assert_eq!(metrics.return_percent, f64::INFINITY);
    }

    #[test]
    fn test_break_even_trade_counts_as_loss() {
        let metrics = MetricsAggregator::default().aggregate(&trades(&[dec!(100), dec!(0)])).unwrap();

        assert_eq!(metrics.winning_trades, 1);
        assert_eq!(metrics.losing_trades, 1);
        assert_eq!(metrics.gross_loss, Decimal::ZERO);
        assert_eq!(metrics.profit_factor, f64::INFINITY);
        assert_eq!(metrics.net_return, f64::INFINITY);
    }

    #[test]
    fn test_only_losses() {
        let metrics = MetricsAggregator::default().aggregate(&trades(&[dec!(-10), dec!(-15.5)])).unwrap();

        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.net_return, -25.5);
        assert_eq!(metrics.return_percent, -0.0);
    }

    #[test]
    fn test_custom_capital() {
        let aggregator = MetricsAggregator::new(dec!(1000)).unwrap();
        let metrics = aggregator.aggregate(&trades(&[dec!(300), dec!(-50)])).unwrap();

        assert_eq!(metrics.net_return, 250.0);
        assert_eq!(metrics.return_percent, 0.25);
        assert_eq!(metrics.profit_factor, 6.0);
    }

    #[test]
    fn test_huge_profit_factor_falls_back_to_float() {
        // 1e27 / 0.01 is beyond the Decimal range.
        let huge = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        let metrics = MetricsAggregator::default()
            .aggregate(&trades(&[huge, dec!(-0.01)]))
            .unwrap();

        assert!((metrics.profit_factor / 1e29 - 1.0).abs() < 1e-9);
        assert!((metrics.net_return / 1e27 - 1.0).abs() < 1e-9);
        assert!((metrics.return_percent / 1e22 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gross_profit_overflow_is_an_error() {
        let err = MetricsAggregator::default()
            .aggregate(&trades(&[Decimal::MAX, Decimal::MAX, dec!(-1)]))
            .unwrap_err();
        assert_eq!(err, LedgerError::Overflow("gross profit"));
    }

    #[test]
    fn test_rejects_non_positive_capital() {
        assert!(MetricsAggregator::new(Decimal::ZERO).is_err());
        assert!(MetricsAggregator::new(dec!(-1)).is_err());
    }
}
