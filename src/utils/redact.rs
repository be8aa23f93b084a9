use serde_json::{json, Value as JsonValue};

pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "api_key",
    "apikey",
    "jwt",
    "credential",
];

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// Recursively mask sensitive fields in a JSON payload before it is
/// persisted anywhere.
pub fn redact(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| {
                    if is_sensitive(k) {
                        (k.clone(), JsonValue::String(REDACTED_PLACEHOLDER.to_string()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Bound a JSON payload to `max_bytes` of serialized size. Oversized
/// payloads are replaced with a marker carrying a short preview, so one
/// huge request can never bloat the audit collection.
pub fn truncate_to_bytes(value: JsonValue, max_bytes: usize) -> JsonValue {
    let serialized = value.to_string();
    if serialized.len() <= max_bytes {
        return value;
    }
    let preview: String = serialized.chars().take(256).collect();
    json!({
        "truncated": true,
        "original_bytes": serialized.len(),
        "preview": preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_sensitive_keys_at_any_depth() {
        let payload = json!({
            "name": "Sam",
            "password": "hunter2",
            "nested": { "Access_Token": "abc", "comment": "fine" },
            "list": [{ "api_key": "xyz" }],
        });
        let redacted = redact(&payload);
        assert_eq!(redacted["name"], "Sam");
        assert_eq!(redacted["password"], REDACTED_PLACEHOLDER);
        assert_eq!(redacted["nested"]["Access_Token"], REDACTED_PLACEHOLDER);
        assert_eq!(redacted["nested"]["comment"], "fine");
        assert_eq!(redacted["list"][0]["api_key"], REDACTED_PLACEHOLDER);
    }

    #[test]
    fn small_payloads_pass_through_untouched() {
        let payload = json!({"a": 1});
        assert_eq!(truncate_to_bytes(payload.clone(), 1024), payload);
    }

    #[test]
    fn oversized_payloads_collapse_to_marker() {
        let payload = json!({ "blob": "x".repeat(10_000) });
        let bounded = truncate_to_bytes(payload, 1024);
        assert_eq!(bounded["truncated"], true);
        assert!(bounded["original_bytes"].as_u64().unwrap() > 1024);
        assert!(bounded["preview"].as_str().unwrap().len() <= 256);
    }
}
