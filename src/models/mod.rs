//! Data models for executions, orders, closed trades, and metrics.

mod closed_trade;
mod execution;
mod metrics;
mod order;

pub use closed_trade::{ClosedTrade, Direction};
pub use execution::{Execution, Side};
pub use metrics::MetricsReport;
pub use order::{Order, OrderBook};
