//! Closed round-trip trade: an opening order matched with the order that flattened it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// Direction of a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Opened with a buy, closed with a sell
    Long,
    /// Opened with a sell, closed with a buy
    Short,
}

impl Direction {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "long" => Some(Self::Long),
            "short" => Some(Self::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// Side of the order that opens a trade in this direction.
    pub fn opening_side(&self) -> Side {
        match self {
            Direction::Long => Side::Buy,
            Direction::Short => Side::Sell,
        }
    }
}

/// A completed position life cycle. Never modified after the matcher emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    /// 1-based position in the matcher's output
    pub sequence_id: u32,

    pub direction: Direction,

    /// Order number of the opener
    pub open_order: String,

    /// Order number of the closer
    pub close_order: String,

    pub open_timestamp: String,

    pub close_timestamp: String,

    /// Total notional of the opening order
    pub open_value: Decimal,

    /// Total notional of the closing order
    pub close_value: Decimal,

    /// Realized profit net of both orders' commissions, rounded to cents
    pub profit: Decimal,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.profit > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::from_label("long"), Some(Direction::Long));
        assert_eq!(Direction::from_label("SHORT"), Some(Direction::Short));
        assert_eq!(Direction::from_label("sideways"), None);
        assert_eq!(Direction::Short.opening_side(), Side::Sell);
        assert_eq!(Direction::Long.as_str(), "long");
    }
}
