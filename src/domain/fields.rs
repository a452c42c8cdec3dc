// Field coercion: turns user supplied values into the stored representation
use crate::domain::error::DocError;
use crate::domain::model::{Field, FieldType};
use crate::domain::warnings::{warn_once, Warning};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Number, Value};

/// Key used to tag binary values
pub const BINARY_TAG: &str = "$binary";

impl FieldType {
    /// Coerce `value` for a field of this type. Null is always accepted.
    pub fn coerce(&self, field: &str, value: Value) -> Result<Value, DocError> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match self {
            FieldType::Any => Ok(value),
            FieldType::String => match value {
                Value::String(_) => Ok(value),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                other => Err(invalid(field, self, &other)),
            },
            FieldType::Integer => coerce_integer(field, value),
            FieldType::Float => coerce_float(field, value),
            FieldType::Boolean => coerce_boolean(field, value),
            FieldType::Binary => coerce_binary(field, value),
            FieldType::Time => coerce_time(field, value),
            FieldType::Array => match value {
                Value::Array(_) => Ok(value),
                other => Err(invalid(field, self, &other)),
            },
            FieldType::Hash => match value {
                Value::Object(_) => Ok(value),
                other => Err(invalid(field, self, &other)),
            },
        }
    }
}

impl Field {
    pub fn coerce(&self, value: Value) -> Result<Value, DocError> {
        self.kind.coerce(&self.name, value)
    }
}

fn invalid(field: &str, kind: &FieldType, value: &Value) -> DocError {
    DocError::InvalidValue {
        field: field.to_string(),
        expected: kind.name(),
        value: value.to_string(),
    }
}

fn coerce_integer(field: &str, value: Value) -> Result<Value, DocError> {
    match &value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Ok(value);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(invalid(field, &FieldType::Integer, &value)),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid(field, &FieldType::Integer, &value)),
        _ => Err(invalid(field, &FieldType::Integer, &value)),
    }
}

fn coerce_float(field: &str, value: Value) -> Result<Value, DocError> {
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| invalid(field, &FieldType::Float, &value))
}

fn coerce_boolean(field: &str, value: Value) -> Result<Value, DocError> {
    let parsed = match &value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(Value::Bool)
        .ok_or_else(|| invalid(field, &FieldType::Boolean, &value))
}

fn binary_value(bytes: &[u8]) -> Value {
    json!({ BINARY_TAG: hex::encode(bytes) })
}

/// Decode a stored binary value back into bytes
pub fn binary_bytes(value: &Value) -> Option<Vec<u8>> {
    let tagged = value.as_object()?.get(BINARY_TAG)?.as_str()?;
    hex::decode(tagged).ok()
}

fn is_tagged_binary(map: &Map<String, Value>) -> bool {
    map.len() == 1
        && map
            .get(BINARY_TAG)
            .and_then(Value::as_str)
            .map(|s| hex::decode(s).is_ok())
            .unwrap_or(false)
}

fn coerce_binary(field: &str, value: Value) -> Result<Value, DocError> {
    match &value {
        Value::Object(map) if is_tagged_binary(map) => Ok(value),
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect();
            bytes
                .map(|b| binary_value(&b))
                .ok_or_else(|| invalid(field, &FieldType::Binary, &value))
        }
        Value::String(s) => {
            warn_once(Warning::StringStoredAsBinary);
            Ok(binary_value(s.as_bytes()))
        }
        _ => Err(invalid(field, &FieldType::Binary, &value)),
    }
}

fn format_time(time: DateTime<Utc>) -> Value {
    Value::String(time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn coerce_time(field: &str, value: Value) -> Result<Value, DocError> {
    match &value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|t| format_time(t.with_timezone(&Utc)))
            .map_err(|_| invalid(field, &FieldType::Time, &value)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(format_time)
            .ok_or_else(|| invalid(field, &FieldType::Time, &value)),
        _ => Err(invalid(field, &FieldType::Time, &value)),
    }
}
