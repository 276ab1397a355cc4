//! Run record: status, state snapshots and per-node execution history.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{StateMap, WorkflowState};

/// Live run shared between the task driving it and status readers.
///
/// Writers hold the lock only between awaits, never across a tool call.
pub type SharedRun = Arc<RwLock<WorkflowRun>>;

/// Status of a node execution and, with the same vocabulary, of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Completed => "completed",
            NodeStatus::Failed => "failed",
            NodeStatus::Skipped => "skipped",
        }
    }

    /// Completed, failed and skipped never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeStatus::Completed | NodeStatus::Failed | NodeStatus::Skipped
        )
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NodeStatus::Pending),
            "running" => Ok(NodeStatus::Running),
            "completed" => Ok(NodeStatus::Completed),
            "failed" => Ok(NodeStatus::Failed),
            "skipped" => Ok(NodeStatus::Skipped),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// One execution of one node. Re-entering a node appends a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecution {
    pub node_id: String,
    pub status: NodeStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub output: Option<StateMap>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl NodeExecution {
    /// A record in `running` state, started now.
    pub fn started(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeStatus::Running,
            started_at: Some(Utc::now()),
            completed_at: None,
            error: None,
            output: None,
            logs: Vec::new(),
        }
    }

    pub fn complete(&mut self, output: StateMap) {
        self.status = NodeStatus::Completed;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = NodeStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }
}

/// One execution of a graph.
///
/// `initial_state` is a snapshot taken at creation and never mutated; `current_state`
/// is the working copy. Once `status` is terminal the record is only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: String,
    pub graph_id: String,
    pub status: NodeStatus,
    pub initial_state: WorkflowState,
    pub current_state: WorkflowState,
    #[serde(default)]
    pub node_executions: Vec<NodeExecution>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_node: Option<String>,
    pub error: Option<String>,
}

impl WorkflowRun {
    /// Creates a pending run; `initial` becomes both the snapshot and the working copy.
    pub fn new(run_id: impl Into<String>, graph_id: impl Into<String>, initial: StateMap) -> Self {
        let initial_state = WorkflowState::new(initial);
        Self {
            run_id: run_id.into(),
            graph_id: graph_id.into(),
            status: NodeStatus::Pending,
            current_state: initial_state.clone(),
            initial_state,
            node_executions: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
            current_node: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Marks the run completed now.
    pub fn mark_completed(&mut self) {
        self.status = NodeStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Marks the run failed now and records the error.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = NodeStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    /// Wraps the run for sharing with the executing task.
    pub fn into_shared(self) -> SharedRun {
        Arc::new(RwLock::new(self))
    }
}
