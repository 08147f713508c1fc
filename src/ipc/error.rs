use crate::error::CoreError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Core errors carry their own wire code; retryable ones say so in the
/// details, so callers know a resubmit is safe.
pub fn core_err(id: &str, e: &CoreError) -> serde_json::Value {
    let details = if e.retryable() {
        Some(json!({ "retryable": true }))
    } else {
        None
    };
    err(id, e.code(), e.to_string(), details)
}
