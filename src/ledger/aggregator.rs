//! Collapses raw executions into one record per order number.

use tracing::debug;

use crate::error::Result;
use crate::models::{Execution, OrderBook};

/// Groups executions by order number.
pub struct OrderAggregator;

impl OrderAggregator {
    /// Build the order book for a batch of executions.
    ///
    /// Executions of the same order must arrive oldest first, since the
    /// latest one decides the order's side, position and timestamp.
    /// Fails only when a running total leaves the `Decimal` range.
    pub fn aggregate(executions: &[Execution]) -> Result<OrderBook> {
        let mut book = OrderBook::new();
        for execution in executions {
            book.record(execution)?;
        }

        debug!(
            executions = executions.len(),
            orders = book.len(),
            "Aggregated executions into orders"
        );
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::models::Side;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn make_execution(
        order: &str,
        side: Side,
        pos: Decimal,
        value: Decimal,
        qty: Decimal,
        commission: Decimal,
        time: &str,
    ) -> Execution {
        Execution {
            order_number: order.to_string(),
            side,
            current_position: pos,
            value,
            price: if qty.is_zero() { Decimal::ZERO } else { value / qty },
            quantity: qty,
            timestamp: time.to_string(),
            commission,
        }
    }

    fn sample() -> Vec<Execution> {
        vec![
            make_execution("100", Side::Buy, dec!(2), dec!(200), dec!(2), dec!(1), "2024-01-01 10:00:00"),
            make_execution("200", Side::Sell, dec!(-1), dec!(55), dec!(1), dec!(0.5), "2024-01-01 10:01:00"),
            make_execution("100", Side::Buy, dec!(5), dec!(310), dec!(3), dec!(1.5), "2024-01-01 10:02:00"),
            make_execution("200", Side::Sell, dec!(0), dec!(54), dec!(1), dec!(0.5), "2024-01-01 10:03:00"),
        ]
    }

    #[test]
    fn test_empty_input() {
        let book = OrderAggregator::aggregate(&[]).unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn test_sums_and_last_write_fields() {
        let book = OrderAggregator::aggregate(&sample()).unwrap();
        assert_eq!(book.len(), 2);

        let buy = book.get("100").unwrap();
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(buy.current_position, dec!(5));
        assert_eq!(buy.total_value, dec!(510));
        assert_eq!(buy.total_quantity, dec!(5));
        assert_eq!(buy.total_commission, dec!(2.5));
        assert_eq!(buy.execution_count, 2);
        assert_eq!(buy.timestamp, "2024-01-01 10:02:00");

        let sell = book.get("200").unwrap();
        assert_eq!(sell.current_position, Decimal::ZERO);
        assert_eq!(sell.total_value, dec!(109));
        assert_eq!(sell.total_quantity, dec!(2));
        assert_eq!(sell.total_commission, dec!(1.0));
        assert_eq!(sell.timestamp, "2024-01-01 10:03:00");
        assert!(!sell.is_open());
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let executions = sample();
        assert_eq!(
            OrderAggregator::aggregate(&executions).unwrap(),
            OrderAggregator::aggregate(&executions).unwrap()
        );
    }

    #[test]
    fn test_sums_do_not_depend_on_interleaving() {
        let executions = sample();
        let reordered = vec![
            executions[0].clone(),
            executions[2].clone(),
            executions[1].clone(),
            executions[3].clone(),
        ];

        let a = OrderAggregator::aggregate(&executions).unwrap();
        let b = OrderAggregator::aggregate(&reordered).unwrap();
        assert_eq!(a.get("100"), b.get("100"));
        assert_eq!(a.get("200"), b.get("200"));
    }

    #[test]
    fn test_quantity_overflow_is_an_error() {
        let executions = vec![
            make_execution("1", Side::Buy, dec!(1), dec!(10), Decimal::MAX, dec!(0), "t1"),
            make_execution("1", Side::Buy, dec!(2), dec!(10), dec!(1), dec!(0), "t2"),
        ];

        let err = OrderAggregator::aggregate(&executions).unwrap_err();
        assert_eq!(err, LedgerError::Overflow("order total quantity"));
    }
}
