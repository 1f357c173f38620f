//! Typed bind parameters and result cells.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    /// Converts one element of the generator's `params` array.
    ///
    /// Integral numbers stay integers. Arrays and objects are bound as their
    /// JSON text.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BindValue::Int(i),
                None => BindValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BindValue::Text(s.clone()),
            other => BindValue::Text(other.to_string()),
        }
    }

    /// Text form used when checking which identity a parameter carries.
    pub fn as_text(&self) -> Option<String> {
        match self {
            BindValue::Null => None,
            BindValue::Bool(b) => Some(b.to_string()),
            BindValue::Int(i) => Some(i.to_string()),
            BindValue::Float(f) => Some(f.to_string()),
            BindValue::Text(s) => Some(s.clone()),
        }
    }
}

impl Serialize for BindValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            BindValue::Null => s.serialize_none(),
            BindValue::Bool(b) => s.serialize_bool(*b),
            BindValue::Int(i) => s.serialize_i64(*i),
            BindValue::Float(f) => s.serialize_f64(*f),
            BindValue::Text(t) => s.serialize_str(t),
        }
    }
}

/// One decoded result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell; text is parsed when it looks like a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Numeric(d) => d.to_f64(),
            CellValue::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Numeric(d) => d.trunc().to_i64(),
            CellValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            CellValue::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    /// Calendar date view; timestamps are truncated to their date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Timestamp(t) => Some(t.date()),
            CellValue::TimestampTz(t) => Some(t.date_naive()),
            CellValue::Text(t) => NaiveDate::parse_from_str(t.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Numeric(d) => write!(f, "{d}"),
            CellValue::Text(t) => f.write_str(t),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            CellValue::TimestampTz(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%:z")),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => s.serialize_none(),
            CellValue::Bool(b) => s.serialize_bool(*b),
            CellValue::Int(i) => s.serialize_i64(*i),
            CellValue::Float(x) => s.serialize_f64(*x),
            // Text keeps NUMERIC scale intact ("85.50").
            CellValue::Numeric(d) => s.serialize_str(&d.to_string()),
            CellValue::Text(t) => s.serialize_str(t),
            CellValue::Date(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            CellValue::Timestamp(t) => s.serialize_str(&t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            CellValue::TimestampTz(t) => s.serialize_str(&t.to_rfc3339()),
        }
    }
}

/// Tabular result of one statement.
///
/// `columns` is empty when the statement returned no rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bind_from_json_keeps_integers_integral() {
        assert_eq!(BindValue::from_json(&json!(42)), BindValue::Int(42));
        assert_eq!(BindValue::from_json(&json!(1.5)), BindValue::Float(1.5));
        assert_eq!(
            BindValue::from_json(&json!("202311081040")),
            BindValue::Text("202311081040".into())
        );
        assert_eq!(BindValue::from_json(&json!(null)), BindValue::Null);
        assert_eq!(
            BindValue::from_json(&json!([1, 2])),
            BindValue::Text("[1,2]".into())
        );
    }

    #[test]
    fn cells_render_like_the_database_prints_them() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(CellValue::Date(d).to_string(), "2024-05-01");
        assert_eq!(
            CellValue::Numeric(Decimal::new(8550, 2)).to_string(),
            "85.50"
        );
        assert_eq!(CellValue::Null.to_string(), "NULL");
    }

    #[test]
    fn numeric_views() {
        assert_eq!(CellValue::Numeric(Decimal::new(8550, 2)).as_f64(), Some(85.5));
        assert_eq!(CellValue::Text(" 7 ".into()).as_i64(), Some(7));
        assert_eq!(CellValue::Float(3.9).as_i64(), Some(3));
        assert_eq!(CellValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn serializes_cells_as_plain_json() {
        let r = QueryResult {
            columns: vec!["grade".into(), "date".into(), "c".into()],
            rows: vec![vec![
                CellValue::Numeric(Decimal::new(9000, 2)),
                CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()),
                CellValue::Null,
            ]],
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["rows"][0], json!(["90.00", "2024-03-02", null]));
    }
}
