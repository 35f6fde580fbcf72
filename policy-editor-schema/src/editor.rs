//! Editor JSON schema adapter over `serde_json`

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Format, Result, TranslationError};
use crate::model::{PolicyDocument, POLICY, POLICY_SET};

/// Parse editor JSON bytes into a policy document.
///
/// A `policy-set` root member is preferred over a `policy` one when both are present.
pub(crate) fn parse(bytes: &[u8]) -> Result<PolicyDocument> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| TranslationError::parse(Format::Json, e.to_string()))?;

    let mut root = match value {
        Value::Object(root) => root,
        other => return Err(TranslationError::UnrecognizedRoot(json_kind(&other).to_string())),
    };

    if let Some(set) = take_member(&mut root, POLICY_SET) {
        return from_member(set).map(PolicyDocument::PolicySet);
    }
    if let Some(policy) = take_member(&mut root, POLICY) {
        return from_member(policy).map(PolicyDocument::Policy);
    }

    let keys: Vec<&str> = root.keys().map(String::as_str).collect();
    Err(TranslationError::UnrecognizedRoot(if keys.is_empty() {
        "{}".to_string()
    } else {
        keys.join(", ")
    }))
}

/// Serialize a policy document as editor JSON
pub(crate) fn serialize(document: &PolicyDocument, pretty: bool) -> Result<Vec<u8>> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(document)
    } else {
        serde_json::to_vec(document)
    };
    bytes.map_err(|e| TranslationError::serialize(Format::Json, e.to_string()))
}

/// Remove a root member, treating `null` like a missing key
fn take_member(root: &mut Map<String, Value>, key: &str) -> Option<Value> {
    root.remove(key).filter(|value| !value.is_null())
}

fn from_member<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| TranslationError::parse(Format::Json, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
