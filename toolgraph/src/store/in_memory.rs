use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::graph::GraphDefinition;
use crate::state::WorkflowRun;

use super::{GraphSummary, RunSummary, StoreError, WorkflowStore};

#[derive(Clone)]
struct StoredGraph {
    definition: GraphDefinition,
    created_at: DateTime<Utc>,
}

/// Process-local store; contents are lost when it is dropped.
///
/// Used by tests and by the server when no database path is configured.
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    graphs: DashMap<String, StoredGraph>,
    runs: DashMap<String, WorkflowRun>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn save_graph(&self, graph_id: &str, definition: &GraphDefinition) -> Result<(), StoreError> {
        let created_at = self
            .graphs
            .get(graph_id)
            .map(|g| g.created_at)
            .unwrap_or_else(Utc::now);
        self.graphs.insert(
            graph_id.to_string(),
            StoredGraph {
                definition: definition.clone(),
                created_at,
            },
        );
        Ok(())
    }

    async fn load_graph(&self, graph_id: &str) -> Result<Option<GraphDefinition>, StoreError> {
        Ok(self.graphs.get(graph_id).map(|g| g.definition.clone()))
    }

    async fn list_graphs(&self) -> Result<Vec<GraphSummary>, StoreError> {
        let mut out: Vec<GraphSummary> = self
            .graphs
            .iter()
            .map(|entry| GraphSummary {
                graph_id: entry.key().clone(),
                description: entry.definition.description.clone(),
                created_at: entry.created_at,
            })
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn save_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
        self.runs.insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, StoreError> {
        Ok(self.runs.get(run_id).map(|r| r.clone()))
    }

    async fn list_runs(&self, graph_id: Option<&str>) -> Result<Vec<RunSummary>, StoreError> {
        let mut out: Vec<RunSummary> = self
            .runs
            .iter()
            .filter(|r| graph_id.map_or(true, |g| r.graph_id == g))
            .map(|r| RunSummary::from(r.value()))
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn delete_graph(&self, graph_id: &str) -> Result<bool, StoreError> {
        let existed = self.graphs.remove(graph_id).is_some();
        self.runs.retain(|_, run| run.graph_id != graph_id);
        Ok(existed)
    }

    async fn delete_run(&self, run_id: &str) -> Result<bool, StoreError> {
        Ok(self.runs.remove(run_id).is_some())
    }
}
