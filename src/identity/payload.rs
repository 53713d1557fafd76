//! Tolerant extraction from untyped vendor payloads. The vendor has shipped
//! several field layouts over time, so lookups walk an ordered candidate list
//! instead of binding to one schema.

use serde_json::Value;

/// Session id candidates, most specific first.
pub const SESSION_ID_KEYS: &[&str] = &["verification_session_id", "session_id", "id"];

/// Human-readable reason candidates.
pub const REASON_KEYS: &[&str] = &["reason", "message", "status_detail"];

/// Vendor-side verification id candidates.
pub const VERIFICATION_ID_KEYS: &[&str] = &["verification_id"];

/// Return the first candidate key holding a non-empty string value.
/// Non-string and whitespace-only values are skipped, not errors.
pub fn first_string<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    })
}
