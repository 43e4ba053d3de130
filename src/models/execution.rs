//! Execution model: a single fill reported for an order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of an execution or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "B")]
    Buy,
    #[serde(rename = "S")]
    Sell,
}

impl Side {
    /// Parse the single-letter wire code (`B` / `S`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "B" | "BUY" => Some(Side::Buy),
            "S" | "SELL" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// One fill event for an order. Several executions may share an order number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Order this fill belongs to
    pub order_number: String,

    /// Fill direction
    pub side: Side,

    /// Signed quantity still open for the order after this fill (zero = flat)
    pub current_position: Decimal,

    /// Monetary notional of the fill
    pub value: Decimal,

    /// Fill price
    pub price: Decimal,

    /// Executed size
    pub quantity: Decimal,

    /// Fill time as reported by the source
    pub timestamp: String,

    /// Fee charged for the fill
    pub commission: Decimal,
}
