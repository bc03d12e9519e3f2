//! Serialization utilities
//!
//! This module provides conversion from JSON payloads
//! to routine arguments.

use crate::types::PostgresValue;

/// Convert a single JSON value into the closest PostgresValue
///
/// Strings always become `Text`; callers that know a field is a timestamp or
/// uuid convert it themselves.
pub fn value_from_json(value: serde_json::Value) -> PostgresValue {
    match value {
        serde_json::Value::String(s) => PostgresValue::Text(s),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => PostgresValue::Integer(small),
                    Err(_) => PostgresValue::BigInt(i),
                }
            } else if let Some(u) = n.as_u64() {
                // beyond i64::MAX
                PostgresValue::Decimal(u.to_string())
            } else if let Some(f) = n.as_f64() {
                PostgresValue::Float(f)
            } else {
                PostgresValue::Json(serde_json::Value::Number(n))
            }
        }
        serde_json::Value::Bool(b) => PostgresValue::Boolean(b),
        serde_json::Value::Null => PostgresValue::Null,
        serde_json::Value::Array(items) if items.iter().all(|v| v.is_string()) => {
            PostgresValue::TextArray(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        serde_json::Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            )
        }
        other => PostgresValue::Json(other),
    }
}
