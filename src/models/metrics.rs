//! Portfolio metrics derived from a batch of closed trades.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Summary statistics for one reconciliation run.
///
/// The three headline figures are rounded to two decimals and may be
/// `f64::INFINITY` when the batch has no losing trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Gross profit / |gross loss|
    pub profit_factor: f64,

    /// Gross profit - |gross loss|
    pub net_return: f64,

    /// Net return relative to starting capital
    pub return_percent: f64,

    // === Breakdown ===
    /// Sum of profits over winning trades
    pub gross_profit: Decimal,

    /// Sum of profits over trades with profit <= 0 (never positive)
    pub gross_loss: Decimal,

    pub winning_trades: u32,

    /// Includes break-even trades
    pub losing_trades: u32,
}

impl MetricsReport {
    pub fn total_trades(&self) -> u32 {
        self.winning_trades + self.losing_trades
    }

    /// Share of trades closed with a positive profit (0.0 to 1.0).
    pub fn win_rate(&self) -> f64 {
        match self.total_trades() {
            0 => 0.0,
            total => self.winning_trades as f64 / total as f64,
        }
    }
}
