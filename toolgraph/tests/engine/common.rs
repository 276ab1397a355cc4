//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use toolgraph::{
    FnListener, FnTool, StateMap, ToolError, ToolRegistry, WorkflowEngine, WorkflowEvent,
};

pub fn map(v: Value) -> StateMap {
    v.as_object().cloned().unwrap_or_default()
}

/// Tools used across tests:
/// - `returns_x`: `{"x": 1}`
/// - `done`: the string `"done"`
/// - `echo`: its arguments as an object
/// - `increment`: `{"count": count + 1}`
/// - `explode`: always fails
pub fn test_tools() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools
        .register(FnTool::new("returns_x", "", |_| Ok(json!({"x": 1}))))
        .register(FnTool::new("done", "", |_| Ok(json!("done"))))
        .register(FnTool::new("echo", "", |args| Ok(Value::Object(args))))
        .register(FnTool::new("increment", "", |args| {
            let count = args.get("count").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!({"count": count + 1}))
        }))
        .register(FnTool::new("explode", "", |_| {
            Err(ToolError::Execution("kaboom".into()))
        }));
    tools
}

pub fn engine() -> WorkflowEngine {
    WorkflowEngine::new(Arc::new(test_tools()))
}

/// Registers a listener that records every event and returns the shared log.
pub fn record_events(engine: &WorkflowEngine) -> Arc<Mutex<Vec<WorkflowEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    engine.add_event_listener(Arc::new(FnListener::new(move |ev: &WorkflowEvent| {
        sink.lock().unwrap().push(ev.clone());
        Ok(())
    })));
    seen
}
