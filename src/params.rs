use std::collections::BTreeSet;

use serde_json::{Map, Value as JsonValue};

use crate::error::VoucherError;

/// Checks that `obj` carries exactly the mandatory keys and no keys outside
/// `mandatory ∪ optional`. Missing keys and unexpected keys are both
/// rejected as `BadRequest`, with sorted, single-quoted, comma-joined names
/// in the message.
pub fn validate_params(
    obj: &Map<String, JsonValue>,
    mandatory: &[&str],
    optional: &[&str],
) -> Result<(), VoucherError> {
    let present: BTreeSet<&str> = obj.keys().map(String::as_str).collect();
    let mandatory_set: BTreeSet<&str> = mandatory.iter().copied().collect();
    let allowed: BTreeSet<&str> = mandatory.iter().chain(optional.iter()).copied().collect();

    let missing: Vec<&str> = mandatory_set.difference(&present).copied().collect();
    if !missing.is_empty() {
        return Err(VoucherError::BadRequest(format!(
            "Missing request parameters: '{}'",
            missing.join("', '")
        )));
    }

    let extra: Vec<&str> = present.difference(&allowed).copied().collect();
    if !extra.is_empty() {
        return Err(VoucherError::BadRequest(format!(
            "Unexpected request parameters: '{}'",
            extra.join("', '")
        )));
    }

    Ok(())
}

/// Pulls a mandatory string field out of a validated JSON object.
pub fn require_str(obj: &Map<String, JsonValue>, key: &str) -> Result<String, VoucherError> {
    obj.get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| VoucherError::BadRequest(format!("'{key}' must be a string.")))
}
