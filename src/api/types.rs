//! Wire types for the execution feed and the report endpoint.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{LedgerError, Result};
use crate::models::{ClosedTrade, Execution, MetricsReport, Side};

/// Raw execution record as served by the execution feed.
///
/// Every field is optional and loosely typed on the wire so that a missing or
/// unusable one can be reported by name and record index instead of failing
/// the whole batch with a parser error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionRecord {
    #[serde(default)]
    pub orderno: Option<Value>,
    #[serde(default)]
    pub buysell: Option<String>,
    #[serde(default)]
    pub currentpos: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    /// Fee, spelled as the feed spells it
    #[serde(default)]
    pub comission: Option<Value>,
}

impl ExecutionRecord {
    /// Validate the record at position `index` of its batch.
    pub fn into_execution(self, index: usize) -> Result<Execution> {
        let order_number = text_field(self.orderno, index, "orderno")?;

        let code = require(self.buysell, index, "buysell")?;
        let side = Side::from_code(&code).ok_or_else(|| LedgerError::invalid(index, "buysell", &code))?;

        Ok(Execution {
            order_number,
            side,
            current_position: decimal_field(self.currentpos, index, "currentpos")?,
            value: decimal_field(self.value, index, "value")?,
            price: decimal_field(self.price, index, "price")?,
            quantity: decimal_field(self.quantity, index, "quantity")?,
            timestamp: text_field(self.time, index, "time")?,
            commission: decimal_field(self.comission, index, "comission")?,
        })
    }
}

/// Convert a whole batch, failing on the first malformed record.
pub fn parse_records(records: Vec<ExecutionRecord>) -> Result<Vec<Execution>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_execution(index))
        .collect()
}

fn require<T>(field: Option<T>, index: usize, name: &'static str) -> Result<T> {
    field.ok_or_else(|| LedgerError::missing(index, name))
}

/// Accept amounts sent as JSON numbers or numeric strings, plain or scientific.
fn decimal_field(field: Option<Value>, index: usize, name: &'static str) -> Result<Decimal> {
    let raw = match field {
        None | Some(Value::Null) => return Err(LedgerError::missing(index, name)),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => return Err(LedgerError::invalid(index, name, other)),
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| LedgerError::invalid(index, name, &raw))
}

/// Accept identifiers and timestamps sent either as strings or as numbers.
fn text_field(field: Option<Value>, index: usize, name: &'static str) -> Result<String> {
    match field {
        None | Some(Value::Null) => Err(LedgerError::missing(index, name)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(LedgerError::invalid(index, name, other)),
    }
}

/// Envelope posted to the report endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEnvelope {
    pub id: String,
    pub data: ReportData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    #[serde(rename = "closeTrades")]
    pub close_trades: Vec<CloseTradeRow>,
    pub metrics: MetricsRow,
}

/// One closed trade, keyed the way downstream consumers expect.
#[derive(Debug, Clone, Serialize)]
pub struct CloseTradeRow {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Дата открытия")]
    pub opened_at: String,
    #[serde(rename = "Дата закрытия")]
    pub closed_at: String,
    #[serde(rename = "Цена открытия", with = "rust_decimal::serde::float")]
    pub open_value: Decimal,
    #[serde(rename = "Цена закрытия", with = "rust_decimal::serde::float")]
    pub close_value: Decimal,
    #[serde(rename = "Прибыль", with = "rust_decimal::serde::float")]
    pub profit: Decimal,
}

impl From<&ClosedTrade> for CloseTradeRow {
    fn from(trade: &ClosedTrade) -> Self {
        Self {
            id: trade.sequence_id,
            opened_at: trade.open_timestamp.clone(),
            closed_at: trade.close_timestamp.clone(),
            open_value: trade.open_value,
            close_value: trade.close_value,
            profit: trade.profit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsRow {
    #[serde(rename = "Profit Factor", serialize_with = "serialize_metric")]
    pub profit_factor: f64,
    #[serde(rename = "Return", serialize_with = "serialize_metric")]
    pub net_return: f64,
    #[serde(rename = "Return %", serialize_with = "serialize_metric")]
    pub return_percent: f64,
}

impl From<&MetricsReport> for MetricsRow {
    fn from(report: &MetricsReport) -> Self {
        Self {
            profit_factor: report.profit_factor,
            net_return: report.net_return,
            return_percent: report.return_percent,
        }
    }
}

/// JSON has no infinity literal; non-finite values go out as strings.
fn serialize_metric<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_sign_positive() {
        serializer.serialize_str("Infinity")
    } else {
        serializer.serialize_str("-Infinity")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(value: Value) -> ExecutionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parses_feed_record() {
        let execution = record(json!({
            "orderno": "7001",
            "buysell": "B",
            "currentpos": 10,
            "value": 1520.5,
            "price": 152.05,
            "quantity": 10,
            "time": "2024-01-15 10:30:00",
            "comission": 0.76
        }))
        .into_execution(0)
        .unwrap();

        assert_eq!(execution.order_number, "7001");
        assert_eq!(execution.side, Side::Buy);
        assert_eq!(execution.current_position, dec!(10));
        assert_eq!(execution.value, dec!(1520.5));
        assert_eq!(execution.price, dec!(152.05));
        assert_eq!(execution.commission, dec!(0.76));
        assert_eq!(execution.timestamp, "2024-01-15 10:30:00");
    }

    #[test]
    fn test_numeric_order_number_and_string_amounts() {
        let execution = record(json!({
            "orderno": 42,
            "buysell": "S",
            "currentpos": "-3",
            "value": "300.10",
            "price": "100.0333",
            "quantity": "3",
            "time": 1705314600,
            "comission": "0"
        }))
        .into_execution(5)
        .unwrap();

        assert_eq!(execution.order_number, "42");
        assert_eq!(execution.side, Side::Sell);
        assert_eq!(execution.current_position, dec!(-3));
        assert_eq!(execution.value, dec!(300.10));
        assert_eq!(execution.timestamp, "1705314600");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = record(json!({
            "orderno": "1",
            "buysell": "B",
            "currentpos": 1,
            "value": 10,
            "price": 10,
            "quantity": 1,
            "time": "t"
        }))
        .into_execution(4)
        .unwrap_err();

        assert_eq!(err, LedgerError::missing(4, "comission"));
    }

    #[test]
    fn test_null_and_bad_side_are_malformed() {
        let err = record(json!({ "orderno": null })).into_execution(0).unwrap_err();
        assert_eq!(err, LedgerError::missing(0, "orderno"));

        let err = record(json!({ "orderno": "1", "buysell": "X" }))
            .into_execution(2)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MalformedRecord { index: 2, field: "buysell", .. }
        ));
    }

    #[test]
    fn test_bad_number_is_malformed_with_its_index() {
        let good = json!({
            "orderno": "1", "buysell": "B", "currentpos": 1, "value": 10,
            "price": 10, "quantity": 1, "time": "t", "comission": 0
        });
        let mut bad = good.clone();
        bad["currentpos"] = json!("abc");
        let records: Vec<ExecutionRecord> = serde_json::from_value(json!([good, bad])).unwrap();

        let err = parse_records(records).unwrap_err();
        assert_eq!(err, LedgerError::invalid(1, "currentpos", "abc"));

        let err = record(json!({
            "orderno": "1", "buysell": "S", "currentpos": 0, "value": [1],
            "price": 1, "quantity": 1, "time": "t", "comission": 0
        }))
        .into_execution(3)
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MalformedRecord { index: 3, field: "value", .. }
        ));
    }

    #[test]
    fn test_scientific_amounts() {
        let execution = record(json!({
            "orderno": "1", "buysell": "B", "currentpos": 1, "value": 1e21,
            "price": "2.5e-3", "quantity": 1, "time": "t", "comission": 0
        }))
        .into_execution(0)
        .unwrap();

        assert_eq!(execution.value, Decimal::from_i128_with_scale(10i128.pow(21), 0));
        assert_eq!(execution.price, dec!(0.0025));
    }

    #[test]
    fn test_parse_records_reports_first_bad_index() {
        let good = json!({
            "orderno": "1", "buysell": "B", "currentpos": 1, "value": 10,
            "price": 10, "quantity": 1, "time": "t", "comission": 0
        });
        let records: Vec<ExecutionRecord> =
            serde_json::from_value(json!([good.clone(), good, { "orderno": "2" }])).unwrap();

        let err = parse_records(records).unwrap_err();
        assert_eq!(err, LedgerError::missing(2, "buysell"));
    }

    #[test]
    fn test_envelope_wire_format() {
        let trade = ClosedTrade {
            sequence_id: 1,
            direction: Direction::Long,
            open_order: "1".to_string(),
            close_order: "2".to_string(),
            open_timestamp: "2024-01-15 10:30:00".to_string(),
            close_timestamp: "2024-01-15 14:00:00".to_string(),
            open_value: dec!(1520.5),
            close_value: dec!(1600),
            profit: dec!(77.99),
        };
        let envelope = ReportEnvelope {
            id: "72N6LvBOj".to_string(),
            data: ReportData {
                close_trades: vec![CloseTradeRow::from(&trade)],
                metrics: MetricsRow {
                    profit_factor: f64::INFINITY,
                    net_return: 85.0,
                    return_percent: 0.0,
                },
            },
        };

        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": "72N6LvBOj",
                "data": {
                    "closeTrades": [{
                        "ID": 1,
                        "Дата открытия": "2024-01-15 10:30:00",
                        "Дата закрытия": "2024-01-15 14:00:00",
                        "Цена открытия": 1520.5,
                        "Цена закрытия": 1600.0,
                        "Прибыль": 77.99
                    }],
                    "metrics": {
                        "Profit Factor": "Infinity",
                        "Return": 85.0,
                        "Return %": 0.0
                    }
                }
            })
        );
    }
}
