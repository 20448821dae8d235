//! Attribute Casts
//!
//! Declared casts normalize raw stored values on read and write. `Null`
//! always passes through unchanged, and a value that cannot be coerced to the
//! declared type is passed through unchanged rather than erroring.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Cast types an entity definition can declare per attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Int,
    Float,
    Bool,
    String,
    /// Stored as a serialized JSON string, exposed as structured data.
    Json,
    /// Stored and exposed as an RFC 3339 string in UTC.
    DateTime,
}

impl Cast {
    /// Coerce a raw stored value for attribute reads.
    pub fn apply(self, value: Value) -> Value {
        if value.is_null() {
            return value;
        }
        match self {
            Cast::Int => to_int(value),
            Cast::Float => to_float(value),
            Cast::Bool => to_bool(value),
            Cast::String => to_string(value),
            Cast::Json => match value {
                Value::String(text) => match serde_json::from_str(&text) {
                    Ok(parsed) => parsed,
                    Err(_) => Value::String(text),
                },
                structured => structured,
            },
            Cast::DateTime => to_datetime(value),
        }
    }

    /// Coerce an incoming value for attribute writes.
    pub fn store(self, value: Value) -> Value {
        if value.is_null() {
            return value;
        }
        match self {
            // Structured data is kept serialized at rest.
            Cast::Json => match value {
                Value::Array(_) | Value::Object(_) => match serde_json::to_string(&value) {
                    Ok(serialized) => Value::String(serialized),
                    Err(_) => value,
                },
                other => other,
            },
            other => other.apply(value),
        }
    }
}

fn to_int(value: Value) -> Value {
    match &value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f as i64)
            } else {
                value
            }
        }
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| s.parse::<f64>().map(|f| Value::from(f as i64)))
            .unwrap_or(value),
        Value::Bool(b) => Value::from(i64::from(*b)),
        _ => value,
    }
}

fn to_float(value: Value) -> Value {
    let coerced = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    };
    match coerced.and_then(serde_json::Number::from_f64) {
        Some(n) => Value::Number(n),
        None => value,
    }
}

fn to_bool(value: Value) -> Value {
    match &value {
        Value::Bool(_) => value,
        Value::Number(n) => Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" | "" => Value::Bool(false),
            _ => value,
        },
        _ => value,
    }
}

fn to_string(value: Value) -> Value {
    match &value {
        Value::String(_) => value,
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        _ => value,
    }
}

fn to_datetime(value: Value) -> Value {
    match &value {
        Value::String(text) => parse_datetime(text)
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(value),
        Value::Number(n) => match n.as_i64().and_then(|ts| Utc.timestamp_opt(ts, 0).single()) {
            Some(dt) => Value::String(dt.to_rfc3339()),
            None => value,
        },
        _ => value,
    }
}

/// Parse the formats the ORM accepts for datetime attributes.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}
