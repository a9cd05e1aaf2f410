use serde_json::Value;

use crate::agent::target::TargetResponse;

use super::verdict::VerificationFailure;

pub(super) fn expect_status(
    response: &TargetResponse,
    expected: u16,
) -> Result<(), VerificationFailure> {
    if response.status != expected {
        return Err(VerificationFailure::new(format!(
            "Expected status code {}, but got {}",
            expected, response.status
        )));
    }
    Ok(())
}

pub(super) fn decode_json(response: &TargetResponse) -> Result<Value, VerificationFailure> {
    serde_json::from_slice(&response.body)
        .map_err(|err| VerificationFailure::new(format!("Cannot decode JSON data ({})", err)))
}

pub(super) fn require_key<'doc>(
    document: &'doc Value,
    key: &str,
) -> Result<&'doc Value, VerificationFailure> {
    document.get(key).ok_or_else(|| {
        VerificationFailure::new(format!("Response JSON does not have \"{}\" key", key))
    })
}

pub(super) fn require_string(value: &Value, key: &str) -> Result<String, VerificationFailure> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| VerificationFailure::new(format!("\"{}\" is not a string", key)))
}

pub(super) fn require_string_list(
    value: &Value,
    key: &str,
) -> Result<Vec<String>, VerificationFailure> {
    let items = value
        .as_array()
        .ok_or_else(|| VerificationFailure::new(format!("\"{}\" is not a list", key)))?;
    items.iter().map(|item| require_string(item, key)).collect()
}
