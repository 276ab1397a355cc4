//! Durable mirror of graph definitions and run records.
//!
//! The engine writes a definition when a graph is created and a run snapshot after
//! `node_completed`, `workflow_completed` and `workflow_failed`. Reads serve status
//! queries for runs that are no longer (or never were) in memory.

mod in_memory;
#[cfg(feature = "sqlite")]
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::GraphDefinition;
use crate::state::{NodeStatus, WorkflowRun};

pub use in_memory::InMemoryWorkflowStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWorkflowStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Listing entry for a stored graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub graph_id: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Listing entry for a stored run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub graph_id: String,
    pub status: NodeStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&WorkflowRun> for RunSummary {
    fn from(run: &WorkflowRun) -> Self {
        Self {
            run_id: run.run_id.clone(),
            graph_id: run.graph_id.clone(),
            status: run.status,
            created_at: run.created_at,
            completed_at: run.completed_at,
        }
    }
}

/// Persistence contract for graphs and runs.
///
/// `save_run` is an idempotent upsert keyed by run id: saving again replaces the record,
/// including its node executions. Listings are newest first.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn save_graph(&self, graph_id: &str, definition: &GraphDefinition) -> Result<(), StoreError>;

    async fn load_graph(&self, graph_id: &str) -> Result<Option<GraphDefinition>, StoreError>;

    async fn list_graphs(&self) -> Result<Vec<GraphSummary>, StoreError>;

    async fn save_run(&self, run: &WorkflowRun) -> Result<(), StoreError>;

    async fn load_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, StoreError>;

    /// Runs of `graph_id`, or of every graph when `None`.
    async fn list_runs(&self, graph_id: Option<&str>) -> Result<Vec<RunSummary>, StoreError>;

    /// Deletes the graph and all of its runs. Returns whether the graph existed.
    async fn delete_graph(&self, graph_id: &str) -> Result<bool, StoreError>;

    async fn delete_run(&self, run_id: &str) -> Result<bool, StoreError>;
}
