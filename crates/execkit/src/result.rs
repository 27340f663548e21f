//! Normalized execution results and the helpers executors share.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of one execution.
///
/// `error` is `None` exactly when the execution succeeded. `output` carries
/// the workflow output or function payload on success, and failure details
/// (or the error payload) otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecuteResult {
    /// Decoded output or failure details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteResult {
    /// A successful result.
    pub fn success(output: Option<Value>) -> Self {
        Self {
            output,
            error: None,
        }
    }

    /// A failed result.
    pub fn failure(error: impl Into<String>, output: Option<Value>) -> Self {
        Self {
            output,
            error: Some(error.into()),
        }
    }

    /// Whether the execution succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Check execution input before any remote call.
///
/// Missing or empty input means "no input" and yields `None`. Anything else,
/// whitespace-only input included, must be a JSON object and is returned
/// unchanged.
pub fn validate_json_object_input(input: Option<&str>) -> Result<Option<&str>> {
    let Some(input) = input.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(_)) => Ok(Some(input)),
        _ => Err(Error::InvalidInput),
    }
}

/// Decode a document that must be valid JSON.
pub fn decode_json(what: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::decode(what, e))
}

/// Replace a string `cause` holding JSON with the parsed value.
///
/// A cause that is not valid JSON is kept as the raw string.
pub fn decode_cause(mut details: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::String(cause)) = details.get("cause")
        && let Ok(parsed) = serde_json::from_str::<Value>(cause)
    {
        details.insert("cause".to_string(), parsed);
    }
    details
}

/// The error message of a Lambda error payload.
///
/// Lambda reports handler errors as an object with `errorMessage`. Only a
/// truthy value counts: a missing, null, false, zero or empty message is a
/// successful payload.
pub fn lambda_error_message(payload: &Value) -> Option<String> {
    let message = payload.as_object()?.get("errorMessage")?;
    match message {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
