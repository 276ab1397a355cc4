//! Engine: owns graphs and runs, drives runs, emits and checkpoints events.
//!
//! Graphs and runs live in concurrent maps keyed by generated UUIDs, so many runs can be
//! created, executed and queried at once. Each run is driven by exactly one task.

mod config;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::event::{event_data, EventBus, EventListener, EventSink, EventType, WorkflowEvent};
use crate::graph::{logging, GraphDefinition, RunContext, WorkflowGraph};
use crate::state::{NodeStatus, SharedRun, StateMap, WorkflowRun};
use crate::store::WorkflowStore;
use crate::tools::ToolRegistry;

pub use config::EngineConfig;

/// Sink for one run: checkpoints the run before broadcasting persisted event types.
///
/// Checkpoints are skipped once the run has been deleted from the engine, so a run deleted
/// mid-execution is not written back to the store.
struct RunEmitter<'a> {
    run: &'a SharedRun,
    run_id: &'a str,
    runs: &'a DashMap<String, SharedRun>,
    bus: &'a EventBus,
    store: Option<&'a Arc<dyn WorkflowStore>>,
}

#[async_trait]
impl EventSink for RunEmitter<'_> {
    async fn emit(&self, event_type: EventType, data: StateMap) {
        if let (true, Some(store)) = (event_type.is_persisted(), self.store) {
            // Held across the save: deletion takes the write lock after unregistering the run.
            let run = self.run.read().await;
            if self.runs.contains_key(self.run_id) {
                if let Err(e) = store.save_run(&run).await {
                    logging::log_store_error("save_run", self.run_id, &e);
                }
            }
        }
        self.bus.publish(&WorkflowEvent::new(event_type, data)).await;
    }
}

/// Registers graphs and executes runs of them.
///
/// **Interaction**: Constructed once per process with an explicit [`ToolRegistry`]; the
/// transport shares it as `Arc<WorkflowEngine>` and uses [`spawn_workflow`](Self::spawn_workflow)
/// for background runs.
pub struct WorkflowEngine {
    tools: Arc<ToolRegistry>,
    graphs: DashMap<String, Arc<WorkflowGraph>>,
    runs: DashMap<String, SharedRun>,
    events: EventBus,
    store: Option<Arc<dyn WorkflowStore>>,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self::with_config(tools, EngineConfig::default())
    }

    pub fn with_config(tools: Arc<ToolRegistry>, config: EngineConfig) -> Self {
        Self {
            tools,
            graphs: DashMap::new(),
            runs: DashMap::new(),
            events: EventBus::new(config.listener_timeout),
            store: None,
            config,
        }
    }

    /// Mirrors graphs and run checkpoints into `store`.
    pub fn with_store(mut self, store: Arc<dyn WorkflowStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&Arc<dyn WorkflowStore>> {
        self.store.as_ref()
    }

    pub fn add_event_listener(&self, listener: Arc<dyn EventListener>) {
        self.events.add_listener(listener);
    }

    /// Builds a graph from `definition`, stores it under a fresh id and returns the id.
    ///
    /// The definition is also saved to the store; a store failure is logged only.
    pub async fn create_graph(&self, definition: GraphDefinition) -> Result<String, WorkflowError> {
        let graph = WorkflowGraph::from_definition(definition)?;
        let graph_id = Uuid::new_v4().to_string();
        if let Some(store) = &self.store {
            if let Err(e) = store.save_graph(&graph_id, graph.definition()).await {
                logging::log_store_error("save_graph", &graph_id, &e);
            }
        }
        self.graphs.insert(graph_id.clone(), Arc::new(graph));
        Ok(graph_id)
    }

    /// Loads every stored graph not already in memory. Returns how many were loaded.
    ///
    /// Stored definitions that no longer validate are logged and skipped.
    pub async fn restore_graphs(&self) -> Result<usize, WorkflowError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let mut restored = 0;
        for summary in store.list_graphs().await? {
            if self.graphs.contains_key(&summary.graph_id) {
                continue;
            }
            let Some(definition) = store.load_graph(&summary.graph_id).await? else {
                continue;
            };
            match WorkflowGraph::from_definition(definition) {
                Ok(graph) => {
                    self.graphs.insert(summary.graph_id, Arc::new(graph));
                    restored += 1;
                }
                Err(e) => logging::log_store_error("restore_graph", &summary.graph_id, &e),
            }
        }
        Ok(restored)
    }

    pub fn get_graph(&self, graph_id: &str) -> Option<Arc<WorkflowGraph>> {
        self.graphs.get(graph_id).map(|g| Arc::clone(g.value()))
    }

    /// Ids of the graphs held in memory, sorted.
    pub fn graph_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.graphs.iter().map(|g| g.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Snapshot of an in-memory run.
    pub async fn get_run(&self, run_id: &str) -> Option<WorkflowRun> {
        let shared = self.runs.get(run_id).map(|r| Arc::clone(r.value()))?;
        let run = shared.read().await.clone();
        Some(run)
    }

    /// In-memory run, else the stored copy.
    pub async fn find_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, WorkflowError> {
        if let Some(run) = self.get_run(run_id).await {
            return Ok(Some(run));
        }
        match &self.store {
            Some(store) => Ok(store.load_run(run_id).await?),
            None => Ok(None),
        }
    }

    /// Snapshots of the in-memory runs, optionally of one graph.
    pub async fn list_runs(&self, graph_id: Option<&str>) -> Vec<WorkflowRun> {
        let shared: Vec<SharedRun> = self.runs.iter().map(|r| Arc::clone(r.value())).collect();
        let mut out = Vec::with_capacity(shared.len());
        for run in shared {
            let run = run.read().await.clone();
            if graph_id.map_or(true, |g| run.graph_id == g) {
                out.push(run);
            }
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Runs `graph_id` on `initial_state` to completion and returns the finished run.
    ///
    /// A failed run is still recorded (status `failed`, `error` set, `workflow_failed`
    /// emitted) before the error is returned.
    pub async fn run_workflow(
        &self,
        graph_id: &str,
        initial_state: StateMap,
    ) -> Result<WorkflowRun, WorkflowError> {
        let (_, graph, run) = self.prepare_run(graph_id, initial_state)?;
        self.drive(&graph, &run).await?;
        let finished = run.read().await.clone();
        Ok(finished)
    }

    /// Registers a run and executes it on a background task; returns its id at once.
    ///
    /// Unknown graphs fail here, before anything is spawned. Progress is observable
    /// through events and [`get_run`](Self::get_run).
    pub fn spawn_workflow(
        self: &Arc<Self>,
        graph_id: &str,
        initial_state: StateMap,
    ) -> Result<String, WorkflowError> {
        let (run_id, graph, run) = self.prepare_run(graph_id, initial_state)?;
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            // Failure is recorded on the run and reported through events.
            let _ = engine.drive(&graph, &run).await;
        });
        Ok(run_id)
    }

    /// Removes a graph and its runs from memory and from the store.
    ///
    /// Runs still executing keep going in the background but are no longer checkpointed.
    pub async fn delete_graph(&self, graph_id: &str) -> Result<bool, WorkflowError> {
        let mut deleted = self.graphs.remove(graph_id).is_some();
        let shared: Vec<(String, SharedRun)> = self
            .runs
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        for (run_id, run) in shared {
            if run.read().await.graph_id == graph_id {
                self.unregister_run(&run_id).await;
            }
        }
        if let Some(store) = &self.store {
            deleted |= store.delete_graph(graph_id).await?;
        }
        Ok(deleted)
    }

    /// Removes a run from memory and from the store. A run deleted while executing is not
    /// written back by its later checkpoints.
    pub async fn delete_run(&self, run_id: &str) -> Result<bool, WorkflowError> {
        let mut deleted = self.unregister_run(run_id).await;
        if let Some(store) = &self.store {
            deleted |= store.delete_run(run_id).await?;
        }
        Ok(deleted)
    }

    /// Drops `run_id` from the run map and waits for any checkpoint already in flight.
    async fn unregister_run(&self, run_id: &str) -> bool {
        match self.runs.remove(run_id) {
            Some((_, run)) => {
                drop(run.write().await);
                true
            }
            None => false,
        }
    }

    fn prepare_run(
        &self,
        graph_id: &str,
        initial_state: StateMap,
    ) -> Result<(String, Arc<WorkflowGraph>, SharedRun), WorkflowError> {
        let graph = self
            .get_graph(graph_id)
            .ok_or_else(|| WorkflowError::GraphNotFound(graph_id.to_string()))?;
        let run_id = Uuid::new_v4().to_string();
        let run = WorkflowRun::new(run_id.clone(), graph_id, initial_state).into_shared();
        self.runs.insert(run_id.clone(), Arc::clone(&run));
        Ok((run_id, graph, run))
    }

    /// Moves `run` through running to completed or failed, emitting the workflow events.
    async fn drive(&self, graph: &WorkflowGraph, run: &SharedRun) -> Result<(), WorkflowError> {
        let (run_id, graph_id) = {
            let mut guard = run.write().await;
            guard.status = NodeStatus::Running;
            (guard.run_id.clone(), guard.graph_id.clone())
        };
        let sink = RunEmitter {
            run,
            run_id: &run_id,
            runs: &self.runs,
            bus: &self.events,
            store: self.store.as_ref(),
        };

        logging::log_graph_start(&run_id, &graph_id);
        sink.emit(
            EventType::WorkflowStarted,
            event_data(json!({"run_id": run_id, "graph_id": graph_id})),
        )
        .await;

        let ctx = RunContext::new(&self.tools, &sink, &self.config);
        match graph.execute(run, ctx).await {
            Ok(()) => {
                run.write().await.mark_completed();
                logging::log_graph_complete(&run_id);
                sink.emit(
                    EventType::WorkflowCompleted,
                    event_data(json!({"run_id": run_id, "status": NodeStatus::Completed})),
                )
                .await;
                Ok(())
            }
            Err(e) => {
                run.write().await.mark_failed(e.to_string());
                logging::log_graph_error(&run_id, &e);
                sink.emit(
                    EventType::WorkflowFailed,
                    event_data(json!({"run_id": run_id, "error": e.to_string()})),
                )
                .await;
                Err(e)
            }
        }
    }
}
