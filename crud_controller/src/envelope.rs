//! Response envelopes
//!
//! Success: `{"success": true, "data": ..., "timestamp": "..."}`
//! Failure: `{"success": false, "error": {"code", "message", "details"?}, "timestamp": "..."}`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Code used when a failure envelope is built without one
pub const DEFAULT_ERROR_CODE: &str = "ERROR";

/// Fallback status, code and message for unclassified failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneralError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: &'static str,
}

pub const STATUS_GENERAL_ERROR: GeneralError = GeneralError {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    code: "INTERNAL_SERVER_ERROR",
    message: "An unexpected error occurred",
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Uniform response wrapper
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T = Value> {
    Success { data: T, timestamp: DateTime<Utc> },
    Failure { error: ErrorBody, timestamp: DateTime<Utc> },
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self::Success {
            data,
            timestamp: Utc::now(),
        }
    }

    /// Failure without details; `code` defaults to `ERROR`
    pub fn failure(message: impl Into<String>, code: Option<&str>) -> Self {
        Self::failure_with_details(message, code, None)
    }

    pub fn failure_with_details(message: impl Into<String>, code: Option<&str>, details: Option<Value>) -> Self {
        Self::Failure {
            error: ErrorBody {
                code: code.unwrap_or(DEFAULT_ERROR_CODE).to_string(),
                message: message.into(),
                details,
            },
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. } | Self::Failure { timestamp, .. } => *timestamp,
        }
    }
}

/// ISO-8601 UTC with milliseconds, e.g. `2024-05-01T10:00:00.000Z`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 3)?;
        match self {
            Self::Success { data, timestamp } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
                state.serialize_field("timestamp", &format_timestamp(timestamp))?;
            }
            Self::Failure { error, timestamp } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.serialize_field("timestamp", &format_timestamp(timestamp))?;
            }
        }
        state.end()
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_shape() {
        let value = serde_json::to_value(Envelope::success(json!({"id": 1}))).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"], json!({"id": 1}));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn success_with_unit_data_keeps_data_key() {
        let value = serde_json::to_value(Envelope::success(())).unwrap();
        assert_eq!(value["data"], Value::Null);
        assert!(value.as_object().unwrap().contains_key("data"));
    }

    #[test]
    fn failure_defaults_code() {
        let value = serde_json::to_value(Envelope::<()>::failure("nope", None)).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!({"code": "ERROR", "message": "nope"}));
    }

    #[test]
    fn failure_keeps_code_and_details() {
        let envelope = Envelope::<()>::failure_with_details("bad", Some("VALIDATION_ERROR"), Some(json!([1])));
        let value = serde_json::to_value(envelope).unwrap();
        assert_eq!(
            value["error"],
            json!({"code": "VALIDATION_ERROR", "message": "bad", "details": [1]})
        );
    }

    #[test]
    fn timestamp_is_iso_with_millis() {
        let envelope = Envelope::success(1);
        let value = serde_json::to_value(&envelope).unwrap();
        let text = value["timestamp"].as_str().unwrap();

        assert!(text.ends_with('Z'));
        assert_eq!(text.len(), "2024-05-01T10:00:00.000Z".len());
        let parsed = DateTime::parse_from_rfc3339(text).unwrap();
        assert!((Utc::now() - parsed.with_timezone(&Utc)).num_seconds() < 5);
    }

    #[test]
    fn general_error_constant() {
        assert_eq!(STATUS_GENERAL_ERROR.status.as_u16(), 500);
        assert_eq!(STATUS_GENERAL_ERROR.code, "INTERNAL_SERVER_ERROR");
    }
}
