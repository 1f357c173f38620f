//! Parameter coercion to the types the server infers for each placeholder.
//!
//! The generator emits most values as JSON strings (`"2024-01-01"`, `"3"`).
//! Bound as TEXT they would fail against DATE or INT4 columns, so each value
//! is parsed into the parameter type reported by `describe` before binding.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};

use crate::value::BindValue;

pub(crate) type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// A parameter value in its bound Rust type. `None` binds a typed NULL.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Typed {
    Bool(Option<bool>),
    Int2(Option<i16>),
    Int4(Option<i32>),
    Int8(Option<i64>),
    Float4(Option<f32>),
    Float8(Option<f64>),
    Numeric(Option<Decimal>),
    Date(Option<NaiveDate>),
    Timestamp(Option<NaiveDateTime>),
    TimestampTz(Option<DateTime<Utc>>),
    Time(Option<NaiveTime>),
    Json(Option<Value>),
    Text(Option<String>),
}

impl Typed {
    /// Binding used when the server reported no parameter types.
    pub(crate) fn natural(value: &BindValue) -> Self {
        match value {
            BindValue::Null => Typed::Text(None),
            BindValue::Bool(b) => Typed::Bool(Some(*b)),
            BindValue::Int(i) => Typed::Int8(Some(*i)),
            BindValue::Float(f) => Typed::Float8(Some(*f)),
            BindValue::Text(s) => Typed::Text(Some(s.clone())),
        }
    }

    pub(crate) fn bind_to<'q>(self, q: PgQuery<'q>) -> PgQuery<'q> {
        match self {
            Typed::Bool(v) => q.bind(v),
            Typed::Int2(v) => q.bind(v),
            Typed::Int4(v) => q.bind(v),
            Typed::Int8(v) => q.bind(v),
            Typed::Float4(v) => q.bind(v),
            Typed::Float8(v) => q.bind(v),
            Typed::Numeric(v) => q.bind(v),
            Typed::Date(v) => q.bind(v),
            Typed::Timestamp(v) => q.bind(v),
            Typed::TimestampTz(v) => q.bind(v),
            Typed::Time(v) => q.bind(v),
            Typed::Json(v) => q.bind(v),
            Typed::Text(v) => q.bind(v),
        }
    }
}

/// Converts `value` to the parameter type named `type_name` (sqlx type name,
/// e.g. `DATE`, `INT4`). Unknown types are bound as text.
///
/// # Errors
/// A description of the value that does not parse as `type_name`.
pub(crate) fn coerce(value: &BindValue, type_name: &str) -> Result<Typed, String> {
    let Some(text) = value.as_text() else {
        return Ok(null_of(type_name));
    };
    let t = text.trim();

    Ok(match type_name {
        "BOOL" => Typed::Bool(Some(parse_bool(t)?)),
        "INT2" => Typed::Int2(Some(parse(t)?)),
        "INT4" => Typed::Int4(Some(parse(t)?)),
        "INT8" => Typed::Int8(Some(parse(t)?)),
        "FLOAT4" => Typed::Float4(Some(parse(t)?)),
        "FLOAT8" => Typed::Float8(Some(parse(t)?)),
        "NUMERIC" => Typed::Numeric(Some(parse(t)?)),
        "DATE" => Typed::Date(Some(parse_date(t)?)),
        "TIMESTAMP" => Typed::Timestamp(Some(parse_timestamp(t)?)),
        "TIMESTAMPTZ" => Typed::TimestampTz(Some(parse_timestamptz(t)?)),
        "TIME" => Typed::Time(Some(parse_time(t)?)),
        "JSON" | "JSONB" => {
            Typed::Json(Some(serde_json::from_str(t).unwrap_or_else(|_| Value::String(text.clone()))))
        }
        _ => Typed::Text(Some(text)),
    })
}

fn null_of(type_name: &str) -> Typed {
    match type_name {
        "BOOL" => Typed::Bool(None),
        "INT2" => Typed::Int2(None),
        "INT4" => Typed::Int4(None),
        "INT8" => Typed::Int8(None),
        "FLOAT4" => Typed::Float4(None),
        "FLOAT8" => Typed::Float8(None),
        "NUMERIC" => Typed::Numeric(None),
        "DATE" => Typed::Date(None),
        "TIMESTAMP" => Typed::Timestamp(None),
        "TIMESTAMPTZ" => Typed::TimestampTz(None),
        "TIME" => Typed::Time(None),
        "JSON" | "JSONB" => Typed::Json(None),
        _ => Typed::Text(None),
    }
}

fn parse<T>(t: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    t.parse().map_err(|e| format!("{t:?}: {e}"))
}

/// Spellings PostgreSQL accepts for boolean input.
fn parse_bool(t: &str) -> Result<bool, String> {
    match t.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(format!("{t:?}: not a boolean")),
    }
}

fn parse_date(t: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .or_else(|_| parse_timestamp(t).map(|ts| ts.date()))
        .map_err(|_| format!("{t:?}: not a date"))
}

fn parse_timestamp(t: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(t, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(t, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("{t:?}: not a timestamp"))
}

/// RFC 3339 keeps its offset; a naive timestamp is taken as UTC.
fn parse_timestamptz(t: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_timestamp(t).map(|n| n.and_utc())
}

fn parse_time(t: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(t, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .map_err(|_| format!("{t:?}: not a time"))
}
