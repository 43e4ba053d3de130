//! Reconciliation core: order aggregation, trade matching, profit.

mod aggregator;
mod config;
mod matcher;
mod profit;

pub use aggregator::OrderAggregator;
pub use config::{LedgerConfig, DEFAULT_SINK_URL, DEFAULT_SOURCE_URL};
pub use matcher::{is_eligible, EarliestClose, FirstFit, MatchingMethod, MatchingPolicy, TradeMatcher};
pub use profit::{round_cents, ProfitCalculator};
