//! Order model: all executions sharing an order number, collapsed into one record.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Execution, Side};
use crate::error::{LedgerError, Result};

/// Aggregated view of an order.
///
/// Field rules when a new execution is folded in:
/// - `side`, `current_position`, `timestamp`: replaced by the newest execution
/// - `total_value`, `total_quantity`, `total_commission`, `total_price`: summed
/// - `execution_count`: incremented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_number: String,

    pub side: Side,

    /// Net open position after the order's latest execution
    pub current_position: Decimal,

    pub total_value: Decimal,

    pub total_quantity: Decimal,

    pub total_commission: Decimal,

    /// Sum of execution prices (kept for parity with the source feed's grouping)
    pub total_price: Decimal,

    pub execution_count: u32,

    /// Time of the latest execution
    pub timestamp: String,
}

impl Order {
    /// Start an order with empty sums, taking identity from its first execution.
    fn empty(execution: &Execution) -> Self {
        Self {
            order_number: execution.order_number.clone(),
            side: execution.side,
            current_position: Decimal::ZERO,
            total_value: Decimal::ZERO,
            total_quantity: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            total_price: Decimal::ZERO,
            execution_count: 0,
            timestamp: String::new(),
        }
    }

    /// Fold one more execution into the order.
    ///
    /// Leaves the order untouched when any running total would overflow.
    pub fn apply(&mut self, execution: &Execution) -> Result<()> {
        let total_value = add(self.total_value, execution.value, "order total value")?;
        let total_quantity = add(self.total_quantity, execution.quantity, "order total quantity")?;
        let total_commission = add(self.total_commission, execution.commission, "order total commission")?;
        let total_price = add(self.total_price, execution.price, "order total price")?;

        self.side = execution.side;
        self.current_position = execution.current_position;
        self.timestamp = execution.timestamp.clone();

        self.total_value = total_value;
        self.total_quantity = total_quantity;
        self.total_commission = total_commission;
        self.total_price = total_price;
        self.execution_count += 1;
        Ok(())
    }

    /// True while the order still holds a position.
    pub fn is_open(&self) -> bool {
        !self.current_position.is_zero()
    }

    /// Quantity a closer must have executed to flatten this order.
    pub fn open_quantity(&self) -> Decimal {
        self.current_position.abs()
    }
}

fn add(total: Decimal, amount: Decimal, what: &'static str) -> Result<Decimal> {
    total.checked_add(amount).ok_or(LedgerError::Overflow(what))
}

/// Orders keyed by order number, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    orders: Vec<Order>,
    index: HashMap<String, usize>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an execution into its order, creating the order on first sight.
    pub fn record(&mut self, execution: &Execution) -> Result<()> {
        let slot = match self.index.get(&execution.order_number) {
            Some(&slot) => slot,
            None => {
                self.orders.push(Order::empty(execution));
                let slot = self.orders.len() - 1;
                self.index.insert(execution.order_number.clone(), slot);
                slot
            }
        };
        self.orders[slot].apply(execution)
    }

    pub fn get(&self, order_number: &str) -> Option<&Order> {
        self.index.get(order_number).map(|&slot| &self.orders[slot])
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    pub fn as_slice(&self) -> &[Order] {
        &self.orders
    }
}

impl<'a> IntoIterator for &'a OrderBook {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}
