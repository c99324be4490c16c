//! Canonical response envelope.
//!
//! Every backend response is normalized into `{success, data, error?,
//! pagination?}` exactly once, at the client boundary. Feature modules and
//! the CLI only ever see this shape, regardless of whether the upstream
//! returned a proper envelope, a bare array, a flat object, or a
//! double-wrapped `data.data` payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), details: None }
    }

    /// Accepts both the structured `{code, message}` shape and the bare
    /// string errors some endpoints still emit.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(message) => Some(Self::new("ERROR", message)),
            other => serde_json::from_value(other).ok(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data, error: None, pagination: None }
    }

    pub fn fail(error: ErrorBody) -> Self {
        Self { success: false, data: Value::Null, error: Some(error), pagination: None }
    }

    /// Normalize any backend payload into the canonical envelope.
    pub fn normalize(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.get("success").and_then(Value::as_bool).is_some() => {
                let success = map.get("success").and_then(Value::as_bool).unwrap_or(false);
                let data = map.remove("data").unwrap_or(Value::Null);
                let error = map.remove("error").and_then(ErrorBody::from_value);
                let pagination =
                    map.remove("pagination").and_then(|p| serde_json::from_value(p).ok());

                // Flatten double-wrapped envelopes: {success, data: {success, data}}
                if success && Self::looks_like_envelope(&data) {
                    return Self::normalize(data);
                }

                Self { success, data, error, pagination }
            }
            // Bare arrays and flat objects are successful payloads without
            // the wrapper; anything else (string, number, null) likewise.
            other => Self::ok(other),
        }
    }

    fn looks_like_envelope(value: &Value) -> bool {
        value
            .as_object()
            .map(|m| m.get("success").and_then(Value::as_bool).is_some() && m.contains_key("data"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_envelope_passes_through() {
        let env = Envelope::normalize(json!({
            "success": true,
            "data": {"id": "c1"},
            "pagination": {"total": 10, "limit": 5, "offset": 0, "has_more": true}
        }));
        assert!(env.success);
        assert_eq!(env.data, json!({"id": "c1"}));
        assert_eq!(env.pagination.unwrap().total, 10);
    }

    #[test]
    fn bare_array_becomes_success() {
        let env = Envelope::normalize(json!([1, 2, 3]));
        assert!(env.success);
        assert_eq!(env.data, json!([1, 2, 3]));
        assert!(env.error.is_none());
    }

    #[test]
    fn flat_object_becomes_success() {
        let env = Envelope::normalize(json!({"balance_cents": 1200, "currency": "usd"}));
        assert!(env.success);
        assert_eq!(env.data["currency"], json!("usd"));
    }

    #[test]
    fn double_wrapped_data_is_flattened() {
        let env = Envelope::normalize(json!({
            "success": true,
            "data": {"success": true, "data": [{"id": "c1"}]}
        }));
        assert!(env.success);
        assert_eq!(env.data, json!([{"id": "c1"}]));
    }

    #[test]
    fn structured_error_is_preserved() {
        let env = Envelope::normalize(json!({
            "success": false,
            "error": {"code": "WALLET_EMPTY", "message": "Insufficient balance"}
        }));
        assert!(!env.success);
        let error = env.error.unwrap();
        assert_eq!(error.code, "WALLET_EMPTY");
        assert_eq!(error.message, "Insufficient balance");
    }

    #[test]
    fn bare_string_error_is_upgraded() {
        let env = Envelope::normalize(json!({"success": false, "error": "database unavailable"}));
        assert!(!env.success);
        assert_eq!(env.error.unwrap().message, "database unavailable");
    }
}
