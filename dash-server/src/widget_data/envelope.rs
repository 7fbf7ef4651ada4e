//! Response envelope probing
//!
//! Widget backends answer in several shapes. Candidates are tried in a
//! fixed order and the first one a normalizer accepts wins:
//!
//! 1. `data` of an explicit success envelope (`success: true` or `code: 0`)
//! 2. the bare body
//! 3. `body.data`
//! 4. `body.data.data`

use serde_json::Value;

/// Candidate payloads of `body`, highest priority first
pub fn candidates(body: &Value) -> Vec<&Value> {
    let mut out = Vec::with_capacity(4);
    let data = body.get("data");

    if is_success_envelope(body)
        && let Some(data) = data
    {
        out.push(data);
    }
    out.push(body);
    if let Some(data) = data {
        out.push(data);
        if let Some(nested) = data.get("data") {
            out.push(nested);
        }
    }
    out
}

/// `{success: true, ...}` or `{code: 0, ...}`
pub fn is_success_envelope(body: &Value) -> bool {
    let Value::Object(map) = body else {
        return false;
    };
    map.get("success") == Some(&Value::Bool(true))
        || map.get("code").and_then(Value::as_i64) == Some(0)
}
