//! Workflow events and their delivery.
//!
//! Runs emit [`WorkflowEvent`]s through an [`EventSink`]; the engine's [`EventBus`] fans
//! them out to registered [`EventListener`]s. A failing, panicking or slow listener is
//! logged and skipped, never propagated into the run.

mod broadcast;
mod bus;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::state::StateMap;

pub use broadcast::BroadcastListener;
pub use bus::{EventBus, FnListener};

/// Event kind, serialized snake_case on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Sent by a streaming transport when a client subscribes.
    Connected,
    /// Transport reply to a client ping.
    Pong,
    WorkflowStarted,
    NodeStarted,
    NodeCompleted,
    NodeFailed,
    WorkflowCompleted,
    WorkflowFailed,
    /// Transport-level error (e.g. an unparsable client message).
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Connected => "connected",
            EventType::Pong => "pong",
            EventType::WorkflowStarted => "workflow_started",
            EventType::NodeStarted => "node_started",
            EventType::NodeCompleted => "node_completed",
            EventType::NodeFailed => "node_failed",
            EventType::WorkflowCompleted => "workflow_completed",
            EventType::WorkflowFailed => "workflow_failed",
            EventType::Error => "error",
        }
    }

    /// Events after which the run record is checkpointed to the store.
    pub fn is_persisted(&self) -> bool {
        matches!(
            self,
            EventType::NodeCompleted | EventType::WorkflowCompleted | EventType::WorkflowFailed
        )
    }

    /// Last event of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventType::WorkflowCompleted | EventType::WorkflowFailed)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{event_type, data, timestamp}`; `data` carries `run_id` for every run event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub event_type: EventType,
    pub data: StateMap,
    pub timestamp: DateTime<Utc>,
}

impl WorkflowEvent {
    pub fn new(event_type: EventType, data: StateMap) -> Self {
        Self {
            event_type,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn run_id(&self) -> Option<&str> {
        self.data.get("run_id").and_then(Value::as_str)
    }
}

/// Turns a `json!({...})` literal into event data; non-objects become empty data.
pub fn event_data(value: Value) -> StateMap {
    match value {
        Value::Object(map) => map,
        _ => StateMap::new(),
    }
}

#[derive(Debug, Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

/// Subscriber to workflow events.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &WorkflowEvent) -> Result<(), ListenerError>;
}

/// Destination of the events a run emits.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event_type: EventType, data: StateMap);
}
