//! Trade Ledger
//!
//! Reconciles raw trade executions into closed round-trip trades and
//! computes portfolio metrics (profit factor, net return, return %).
//!
//! Pipeline: [`ledger::OrderAggregator`] groups executions per order,
//! [`ledger::TradeMatcher`] pairs open orders with the orders that flatten
//! them, and [`metrics::MetricsAggregator`] reduces the closed trades.

pub mod api;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod reconciler;

pub use error::{LedgerError, Result};
pub use reconciler::{LedgerReport, Reconciler};
