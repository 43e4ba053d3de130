//! Reconciliation configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

use super::MatchingMethod;

pub const DEFAULT_SOURCE_URL: &str = "https://api.meridian.trade/api/trades/test_data";
pub const DEFAULT_SINK_URL: &str = "https://api.meridian.trade/api/test_data";

/// Configuration for fetching, matching, and reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Endpoint returning the raw execution records
    pub source_url: String,

    /// Endpoint receiving the report envelope
    pub sink_url: String,

    /// Correlation id placed in the report envelope
    pub report_id: Option<String>,

    /// Capital the return percentage is measured against
    pub starting_capital: Decimal,

    /// Which closer-selection policy the matcher uses
    pub matching_method: String,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// Total time budget for retrying a failed fetch, in seconds
    pub fetch_retry_secs: u64,
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.starting_capital <= Decimal::ZERO {
            return Err(LedgerError::InvalidConfig(format!(
                "starting capital must be positive, got {}",
                self.starting_capital
            )));
        }
        if MatchingMethod::parse(&self.matching_method).is_none() {
            return Err(LedgerError::InvalidConfig(format!(
                "unknown matching method `{}`",
                self.matching_method
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(LedgerError::InvalidConfig(
                "request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn matching_method(&self) -> Result<MatchingMethod> {
        MatchingMethod::parse(&self.matching_method).ok_or_else(|| {
            LedgerError::InvalidConfig(format!("unknown matching method `{}`", self.matching_method))
        })
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            sink_url: DEFAULT_SINK_URL.to_string(),
            report_id: None,
            starting_capital: dec!(100000),
            matching_method: "first_fit".to_string(),
            request_timeout_secs: 30,
            fetch_retry_secs: 60,
        }
    }
}
