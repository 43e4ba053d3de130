//! Reconciliation pipeline: executions -> orders -> closed trades -> metrics.

use std::fmt;

use rust_decimal::Decimal;
use tracing::info;

use crate::api::{CloseTradeRow, MetricsRow, ReportData, ReportEnvelope};
use crate::error::Result;
use crate::ledger::{LedgerConfig, OrderAggregator, TradeMatcher};
use crate::metrics::MetricsAggregator;
use crate::models::{ClosedTrade, Execution, MetricsReport};

/// Result of reconciling one batch.
#[derive(Debug, Clone)]
pub struct LedgerReport {
    pub executions: usize,
    pub orders: usize,
    /// Order numbers that ended up in no closed trade, in book order
    pub unmatched_orders: Vec<String>,
    pub closed_trades: Vec<ClosedTrade>,
    pub metrics: MetricsReport,
    pub starting_capital: Decimal,
    pub policy: &'static str,
}

impl LedgerReport {
    /// Wire envelope for the report endpoint.
    pub fn envelope(&self, id: impl Into<String>) -> ReportEnvelope {
        ReportEnvelope {
            id: id.into(),
            data: ReportData {
                close_trades: self.closed_trades.iter().map(CloseTradeRow::from).collect(),
                metrics: MetricsRow::from(&self.metrics),
            },
        }
    }
}

impl fmt::Display for LedgerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{:=^78}", " CLOSED TRADES ")?;
        writeln!(
            f,
            "{:>4} {:<6} {:<20} {:<20} {:>12}",
            "ID", "DIR", "OPENED", "CLOSED", "PROFIT"
        )?;
        writeln!(f, "{}", "-".repeat(78))?;
        for trade in &self.closed_trades {
            writeln!(
                f,
                "{:>4} {:<6} {:<20} {:<20} {:>12.2}",
                trade.sequence_id,
                trade.direction.as_str(),
                truncate(&trade.open_timestamp, 20),
                truncate(&trade.close_timestamp, 20),
                trade.profit
            )?;
        }
        writeln!(f)?;
        writeln!(f, "--- Batch ---")?;
        writeln!(f, "Executions:    {}", self.executions)?;
        writeln!(f, "Orders:        {}", self.orders)?;
        writeln!(f, "Closed Trades: {}", self.closed_trades.len())?;
        writeln!(f, "Unmatched:     {}", self.unmatched_orders.len())?;
        writeln!(f, "Policy:        {}", self.policy)?;
        writeln!(f)?;
        writeln!(f, "--- Metrics ---")?;
        writeln!(f, "Gross Profit:  ${:.2}", self.metrics.gross_profit)?;
        writeln!(f, "Gross Loss:    ${:.2}", self.metrics.gross_loss)?;
        writeln!(f, "Win Rate:      {:.1}%", self.metrics.win_rate() * 100.0)?;
        writeln!(f, "Profit Factor: {:.2}", self.metrics.profit_factor)?;
        writeln!(f, "Return:        {:.2}", self.metrics.net_return)?;
        writeln!(
            f,
            "Return %:      {:.2} (capital ${:.2})",
            self.metrics.return_percent, self.starting_capital
        )?;
        writeln!(f, "{:=^78}", "")?;
        Ok(())
    }
}

/// Runs the full pipeline with a fixed matching policy and starting capital.
pub struct Reconciler {
    matcher: TradeMatcher,
    metrics: MetricsAggregator,
}

impl Reconciler {
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            matcher: TradeMatcher::new(config.matching_method()?),
            metrics: MetricsAggregator::new(config.starting_capital)?,
        })
    }

    pub fn with_parts(matcher: TradeMatcher, metrics: MetricsAggregator) -> Self {
        Self { matcher, metrics }
    }

    pub fn reconcile(&self, executions: &[Execution]) -> Result<LedgerReport> {
        let book = OrderAggregator::aggregate(executions)?;
        let closed_trades = self.matcher.match_orders(&book)?;
        let metrics = self.metrics.aggregate(&closed_trades)?;

        let unmatched_orders: Vec<String> = book
            .iter()
            .filter(|o| {
                !closed_trades
                    .iter()
                    .any(|t| t.open_order == o.order_number || t.close_order == o.order_number)
            })
            .map(|o| o.order_number.clone())
            .collect();

        info!(
            executions = executions.len(),
            orders = book.len(),
            closed = closed_trades.len(),
            unmatched = unmatched_orders.len(),
            "Reconciled batch"
        );

        Ok(LedgerReport {
            executions: executions.len(),
            orders: book.len(),
            unmatched_orders,
            closed_trades,
            metrics,
            starting_capital: self.metrics.starting_capital(),
            policy: self.matcher.policy_name(),
        })
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::with_parts(TradeMatcher::default(), MetricsAggregator::default())
    }
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
