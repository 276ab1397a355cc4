//! Resolution of `$state.<key>` references in node params.

use serde_json::Value;

use crate::state::{StateMap, WorkflowState};

use super::condition::STATE_REF_PREFIX;

/// Returns the referenced state value for a `$state.` string (null when absent);
/// any other value is returned as is.
pub fn resolve_value(value: &Value, state: &WorkflowState) -> Value {
    match value {
        Value::String(s) => match s.strip_prefix(STATE_REF_PREFIX) {
            Some(key) => state.get(key).cloned().unwrap_or(Value::Null),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

/// Resolves every top-level param. Nested arrays and objects are passed through untouched.
pub fn resolve_params(params: &StateMap, state: &WorkflowState) -> StateMap {
    params
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, state)))
        .collect()
}
