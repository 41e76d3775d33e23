//! Decoding of result-set cells.
//!
//! The SQL API returns every cell as a string (or `null`), with the real type
//! described by the column's [RowType]. Dates arrive as days since the epoch and
//! timestamps as fractional seconds since the epoch.

use chrono::{DateTime, NaiveDate};
use serde_json::{Number, Value};

use crate::RowType;

pub fn decode_cell(row_type: &RowType, raw: Option<&str>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };
    let decoded = match row_type.data_type.to_ascii_lowercase().as_str() {
        "fixed" => decode_fixed(raw, row_type.scale.unwrap_or(0)),
        "real" => raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number),
        "boolean" => decode_bool(raw),
        "date" => decode_date(raw),
        "timestamp_ntz" | "timestamp_ltz" | "timestamp_tz" => decode_timestamp(raw),
        _ => None,
    };
    decoded.unwrap_or_else(|| Value::String(raw.to_owned()))
}

fn decode_fixed(raw: &str, scale: i32) -> Option<Value> {
    if scale == 0 {
        if let Ok(value) = raw.parse::<i64>() {
            return Some(Value::from(value));
        }
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn decode_bool(raw: &str) -> Option<Value> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(Value::Bool(true)),
        "false" | "0" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn decode_date(raw: &str) -> Option<Value> {
    let days = raw.parse::<i64>().ok()?;
    let date = NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::days(days))?;
    Some(Value::String(date.format("%Y-%m-%d").to_string()))
}

fn decode_timestamp(raw: &str) -> Option<Value> {
    // TIMESTAMP_TZ carries a trailing offset in minutes, separated by a space
    let epoch = raw.split_whitespace().next()?;
    let (negative, magnitude) = match epoch.strip_prefix('-') {
        Some(magnitude) => (true, magnitude),
        None => (false, epoch),
    };
    let (seconds, fraction) = magnitude.split_once('.').unwrap_or((magnitude, "0"));
    let seconds = seconds.parse::<i64>().ok()?;
    let nanos = format!("{fraction:0<9}").get(..9)?.parse::<u32>().ok()?;
    // the fraction shares the sign of the whole value
    let (seconds, nanos) = match (negative, nanos) {
        (false, _) => (seconds, nanos),
        (true, 0) => (-seconds, 0),
        (true, _) => (-seconds - 1, 1_000_000_000 - nanos),
    };
    let timestamp = DateTime::from_timestamp(seconds, nanos)?.naive_utc();
    Some(Value::String(
        timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
    ))
}
