//! Portfolio metrics over closed trades.

mod aggregator;

pub use aggregator::{MetricsAggregator, DEFAULT_STARTING_CAPITAL};
