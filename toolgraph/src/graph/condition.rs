//! Edge conditions: comparisons between a state value and a literal or referenced value.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::error::WorkflowError;
use crate::state::WorkflowState;

use super::definition::ConditionSpec;

/// Prefix marking a string as a reference to a state key, e.g. `$state.summary_length`.
pub const STATE_REF_PREFIX: &str = "$state.";

/// Comparison kind. Unrecognized names are kept and never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionType {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Exists,
    NotExists,
    Unknown(String),
}

impl From<&str> for ConditionType {
    fn from(s: &str) -> Self {
        match s {
            "eq" => ConditionType::Eq,
            "gt" => ConditionType::Gt,
            "lt" => ConditionType::Lt,
            "gte" => ConditionType::Gte,
            "lte" => ConditionType::Lte,
            "exists" => ConditionType::Exists,
            "not_exists" => ConditionType::NotExists,
            other => ConditionType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionType::Eq => "eq",
            ConditionType::Gt => "gt",
            ConditionType::Lt => "lt",
            ConditionType::Gte => "gte",
            ConditionType::Lte => "lte",
            ConditionType::Exists => "exists",
            ConditionType::NotExists => "not_exists",
            ConditionType::Unknown(s) => s,
        };
        f.write_str(s)
    }
}

/// Compiled edge condition, bound to its key and comparison value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: ConditionType,
    pub key: String,
    pub value: Value,
}

impl Condition {
    pub fn new(kind: impl Into<ConditionType>, key: impl Into<String>, value: Value) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
            value,
        }
    }

    /// Builds a condition from its spec; `type` and `key` are required.
    pub fn compile(spec: &ConditionSpec) -> Result<Self, WorkflowError> {
        let kind = spec
            .kind
            .as_deref()
            .ok_or_else(|| WorkflowError::Definition("condition is missing 'type'".into()))?;
        let key = spec
            .key
            .as_deref()
            .ok_or_else(|| WorkflowError::Definition("condition is missing 'key'".into()))?;
        Ok(Self::new(kind, key, spec.value.clone()))
    }

    pub fn evaluate(&self, state: &WorkflowState) -> Result<bool, WorkflowError> {
        evaluate_condition(&self.kind, &self.key, &self.value, state)
    }
}

/// Literal `expected`, or the state value it references. Null reads as absent.
fn resolve_expected<'a>(expected: &'a Value, state: &'a WorkflowState) -> Option<&'a Value> {
    match expected {
        Value::String(s) => match s.strip_prefix(STATE_REF_PREFIX) {
            Some(key) => state.get(key),
            None => Some(expected),
        },
        Value::Null => None,
        other => Some(other),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn compare(key: &str, actual: &Value, expected: &Value) -> Result<Ordering, WorkflowError> {
    let ordering = match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.ok_or_else(|| WorkflowError::IncomparableValues {
        key: key.to_string(),
        actual: actual.clone(),
        expected: expected.clone(),
    })
}

/// Evaluates `kind` on `state[key]` against `expected` (literal or `$state.` reference).
///
/// Ordering comparisons are false when either side is absent, and fail with
/// [`WorkflowError::IncomparableValues`] when both sides are present but have no common
/// order. Unknown kinds evaluate to false.
pub fn evaluate_condition(
    kind: &ConditionType,
    key: &str,
    expected: &Value,
    state: &WorkflowState,
) -> Result<bool, WorkflowError> {
    let actual = state.get(key);
    let expected = resolve_expected(expected, state);

    let ordered = |accept: fn(Ordering) -> bool| -> Result<bool, WorkflowError> {
        match (actual, expected) {
            (Some(a), Some(e)) => Ok(accept(compare(key, a, e)?)),
            _ => Ok(false),
        }
    };

    match kind {
        ConditionType::Eq => Ok(match (actual, expected) {
            (None, None) => true,
            (Some(a), Some(e)) => values_equal(a, e),
            _ => false,
        }),
        ConditionType::Gt => ordered(|o| o == Ordering::Greater),
        ConditionType::Lt => ordered(|o| o == Ordering::Less),
        ConditionType::Gte => ordered(|o| o != Ordering::Less),
        ConditionType::Lte => ordered(|o| o != Ordering::Greater),
        ConditionType::Exists => Ok(actual.is_some()),
        ConditionType::NotExists => Ok(actual.is_none()),
        ConditionType::Unknown(_) => Ok(false),
    }
}
