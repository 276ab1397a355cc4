//! Mutable key-value state carried by a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object used for state data, node params, tool arguments and event payloads.
pub type StateMap = Map<String, Value>;

/// Data threaded through a run. Last write wins; `updated_at` moves on every mutation.
///
/// A key holding JSON `null` reads the same as a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub data: StateMap,
    #[serde(default)]
    pub metadata: StateMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new(StateMap::new())
    }
}

impl WorkflowState {
    /// Creates a state holding `data`, timestamps set to now.
    pub fn new(data: StateMap) -> Self {
        let now = Utc::now();
        Self {
            data,
            metadata: StateMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the value under `key`, or `None` when missing or null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    /// Whether `key` holds a non-null value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
        self.touch();
    }

    /// Merges `updates` into the data; existing keys are overwritten.
    pub fn merge(&mut self, updates: StateMap) {
        self.data.extend(updates);
        self.touch();
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
