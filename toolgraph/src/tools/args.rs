//! Keyword-argument helpers shared by the built-in tools.
//!
//! A JSON `null` argument (e.g. an unresolved `$state.` reference) is treated as omitted.

use serde_json::Value;

use super::ToolError;
use crate::state::StateMap;

/// Keyword arguments passed to [`Tool::call`](super::Tool::call).
pub type ToolArgs = StateMap;

fn present<'a>(args: &'a ToolArgs, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|v| !v.is_null())
}

/// String argument; `None` when omitted. Errors when present with another type.
pub(crate) fn optional_str<'a>(args: &'a ToolArgs, name: &str) -> Result<Option<&'a str>, ToolError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ToolError::InvalidInput(format!(
            "argument '{}' must be a string, got {}",
            name, other
        ))),
    }
}

/// Non-negative integer argument; integral floats such as `300.0` are accepted.
pub(crate) fn optional_usize(args: &ToolArgs, name: &str) -> Result<Option<usize>, ToolError> {
    let Some(v) = present(args, name) else {
        return Ok(None);
    };
    let n = v
        .as_u64()
        .or_else(|| v.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64));
    match n {
        Some(n) => Ok(Some(n as usize)),
        None => Err(ToolError::InvalidInput(format!(
            "argument '{}' must be a non-negative integer, got {}",
            name, v
        ))),
    }
}

pub(crate) fn usize_or(args: &ToolArgs, name: &str, default: usize) -> Result<usize, ToolError> {
    Ok(optional_usize(args, name)?.unwrap_or(default))
}

pub(crate) fn required_usize(args: &ToolArgs, name: &str) -> Result<usize, ToolError> {
    optional_usize(args, name)?
        .ok_or_else(|| ToolError::InvalidInput(format!("missing argument '{}'", name)))
}

pub(crate) fn bool_or(args: &ToolArgs, name: &str, default: bool) -> Result<bool, ToolError> {
    match present(args, name) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ToolError::InvalidInput(format!(
            "argument '{}' must be a boolean, got {}",
            name, other
        ))),
    }
}

/// List of strings; omitted means empty.
pub(crate) fn str_list(args: &ToolArgs, name: &str) -> Result<Vec<String>, ToolError> {
    match present(args, name) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    ToolError::InvalidInput(format!(
                        "argument '{}' must contain only strings, got {}",
                        name, item
                    ))
                })
            })
            .collect(),
        Some(other) => Err(ToolError::InvalidInput(format!(
            "argument '{}' must be a list of strings, got {}",
            name, other
        ))),
    }
}
