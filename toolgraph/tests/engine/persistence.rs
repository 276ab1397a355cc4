//! Engine checkpoints through the SQLite store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use toolgraph::{
    EdgeSpec, EventListener, EventType, GraphDefinition, ListenerError, NodeSpec, NodeStatus,
    SqliteWorkflowStore, StateMap, WorkflowEngine, WorkflowEvent, WorkflowStore,
};

use crate::common::test_tools;

fn a_then_b() -> GraphDefinition {
    GraphDefinition::new("a then b")
        .node(NodeSpec::new("A", "returns_x"))
        .node(NodeSpec::new("B", "done"))
        .edge(EdgeSpec::new("A", "B"))
}

/// Records, per event, whether the store already held the run when the event arrived.
struct StoreObserver {
    store: Arc<dyn WorkflowStore>,
    seen: Mutex<Vec<(EventType, Option<usize>)>>,
}

#[async_trait]
impl EventListener for StoreObserver {
    async fn on_event(&self, event: &WorkflowEvent) -> Result<(), ListenerError> {
        let Some(run_id) = event.run_id() else {
            return Ok(());
        };
        let stored = self
            .store
            .load_run(run_id)
            .await
            .map_err(|e| ListenerError(e.to_string()))?
            .map(|r| r.node_executions.len());
        self.seen.lock().unwrap().push((event.event_type, stored));
        Ok(())
    }
}

/// **Scenario**: A finished run saved to SQLite loads back with the same status, state and history.
#[tokio::test]
async fn run_round_trips_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn WorkflowStore> =
        Arc::new(SqliteWorkflowStore::open(dir.path().join("workflow.db")).unwrap());
    let engine = WorkflowEngine::new(Arc::new(test_tools())).with_store(store.clone());
    let graph_id = engine.create_graph(a_then_b()).await.unwrap();

    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();

    let loaded = store.load_run(&run.run_id).await.unwrap().unwrap();
    assert_eq!(loaded.status, NodeStatus::Completed);
    assert_eq!(loaded.current_state.data, run.current_state.data);
    let ids: Vec<_> = loaded.node_executions.iter().map(|e| e.node_id.clone()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(store.load_graph(&graph_id).await.unwrap(), Some(a_then_b()));
}

/// **Scenario**: workflow_started is not checkpointed; node_completed and terminal events are, before delivery.
#[tokio::test]
async fn checkpoints_precede_persisted_events() {
    let store: Arc<dyn WorkflowStore> = Arc::new(SqliteWorkflowStore::open_in_memory().unwrap());
    let engine = WorkflowEngine::new(Arc::new(test_tools())).with_store(store.clone());
    let observer = Arc::new(StoreObserver {
        store: store.clone(),
        seen: Mutex::new(Vec::new()),
    });
    engine.add_event_listener(observer.clone());
    let graph_id = engine.create_graph(a_then_b()).await.unwrap();

    engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();

    let seen = observer.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            (EventType::WorkflowStarted, None),
            (EventType::NodeStarted, None),
            (EventType::NodeCompleted, Some(1)),
            (EventType::NodeStarted, Some(1)),
            (EventType::NodeCompleted, Some(2)),
            (EventType::WorkflowCompleted, Some(2)),
        ]
    );
}

/// **Scenario**: A failed run is stored as failed and is found by a fresh engine over the same store.
#[tokio::test]
async fn failed_run_visible_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflow.db");
    let run_id = {
        let store: Arc<dyn WorkflowStore> = Arc::new(SqliteWorkflowStore::open(&path).unwrap());
        let engine = WorkflowEngine::new(Arc::new(test_tools())).with_store(store);
        let graph_id = engine
            .create_graph(GraphDefinition::new("").node(NodeSpec::new("A", "explode")))
            .await
            .unwrap();
        assert!(engine.run_workflow(&graph_id, StateMap::new()).await.is_err());
        engine.list_runs(None).await[0].run_id.clone()
    };

    let store: Arc<dyn WorkflowStore> = Arc::new(SqliteWorkflowStore::open(&path).unwrap());
    let engine = WorkflowEngine::new(Arc::new(test_tools())).with_store(store);
    assert!(engine.get_run(&run_id).await.is_none());
    let run = engine.find_run(&run_id).await.unwrap().unwrap();
    assert_eq!(run.status, NodeStatus::Failed);
    assert_eq!(run.node_executions[0].status, NodeStatus::Failed);
    assert_eq!(engine.restore_graphs().await.unwrap(), 1);
    assert!(run.error.is_some());
}
