//! Coercion of raw attribute values into the declared field types.

use catalog_indexer_shared::FieldType;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value};

/// Why a raw value could not be coerced: the expected type and what was found.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mismatch {
    pub expected: &'static str,
    pub found: String,
}

impl Mismatch {
    fn new(field_type: FieldType, found: &Value) -> Self {
        Self {
            expected: field_type.describe(),
            found: describe(found),
        }
    }
}

/// Short description of a JSON value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// Coerce one scalar value.
///
/// Returns `Ok(None)` for values that count as missing: `null` and blank
/// strings.
pub(crate) fn coerce(field_type: FieldType, value: &Value) -> Result<Option<Value>, Mismatch> {
    if value.is_null() {
        return Ok(None);
    }
    if let Value::String(s) = value {
        if s.trim().is_empty() {
            return Ok(None);
        }
    }

    let coerced = match field_type {
        FieldType::Text | FieldType::String => match value {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        FieldType::Integer => match value {
            Value::Number(n) => n.as_i64().map(Value::from),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        FieldType::Decimal | FieldType::Price => match value {
            Value::Number(n) => n.as_f64().and_then(decimal),
            Value::String(s) => s.trim().parse::<f64>().ok().and_then(decimal),
            _ => None,
        },
        FieldType::Boolean => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        FieldType::Date => match value {
            Value::String(s) => parse_date(s.trim()).map(Value::String),
            _ => None,
        },
    };

    coerced
        .map(Some)
        .ok_or_else(|| Mismatch::new(field_type, value))
}

/// A finite float as a JSON number.
pub(crate) fn decimal(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

/// Parse RFC 3339 timestamps or plain dates, normalised to UTC.
fn parse_date(raw: &str) -> Option<String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(
            timestamp
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(midnight.to_rfc3339_opts(SecondsFormat::Secs, true))
}
