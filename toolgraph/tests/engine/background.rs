//! Spawned runs observed through events and status queries.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;
use toolgraph::{
    BroadcastListener, ConditionSpec, EdgeSpec, EventType, GraphDefinition, NodeSpec, NodeStatus,
    StateMap, WorkflowError, WorkflowEvent,
};

use crate::common::{engine, map};

async fn wait_terminal(rx: &mut broadcast::Receiver<WorkflowEvent>, run_id: &str) -> WorkflowEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let ev = rx.recv().await.expect("event channel closed");
            if ev.run_id() == Some(run_id) && ev.event_type.is_terminal() {
                return ev;
            }
        }
    })
    .await
    .expect("run did not finish in time")
}

/// **Scenario**: spawn_workflow returns the run id immediately; the run finishes in the background.
#[tokio::test]
async fn spawned_run_completes_in_background() {
    let engine = Arc::new(engine());
    let broadcast = BroadcastListener::new(256);
    let mut rx = broadcast.subscribe();
    engine.add_event_listener(Arc::new(broadcast));
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("A", "returns_x"))
                .node(NodeSpec::new("B", "done"))
                .edge(EdgeSpec::new("A", "B")),
        )
        .await
        .unwrap();

    let run_id = engine.spawn_workflow(&graph_id, StateMap::new()).unwrap();
    assert!(engine.get_run(&run_id).await.is_some());

    let last = wait_terminal(&mut rx, &run_id).await;
    assert_eq!(last.event_type, EventType::WorkflowCompleted);
    let run = engine.get_run(&run_id).await.unwrap();
    assert_eq!(run.status, NodeStatus::Completed);
    assert_eq!(run.current_state.data["B_result"], json!("done"));
}

/// **Scenario**: A spawned run that fails is queryable as failed; spawn itself returned Ok.
#[tokio::test]
async fn spawned_failure_is_data() {
    let engine = Arc::new(engine());
    let broadcast = BroadcastListener::default();
    let mut rx = broadcast.subscribe();
    engine.add_event_listener(Arc::new(broadcast));
    let graph_id = engine
        .create_graph(GraphDefinition::new("").node(NodeSpec::new("A", "explode")))
        .await
        .unwrap();

    let run_id = engine.spawn_workflow(&graph_id, StateMap::new()).unwrap();
    let last = wait_terminal(&mut rx, &run_id).await;
    assert_eq!(last.event_type, EventType::WorkflowFailed);
    let run = engine.get_run(&run_id).await.unwrap();
    assert_eq!(run.status, NodeStatus::Failed);
    assert!(run.error.is_some());
}

/// **Scenario**: spawn_workflow on an unknown graph errors synchronously.
#[tokio::test]
async fn spawn_unknown_graph_errors_immediately() {
    let engine = Arc::new(engine());
    let err = engine.spawn_workflow("nope", StateMap::new()).unwrap_err();
    assert!(matches!(err, WorkflowError::GraphNotFound(_)));
}

/// **Scenario**: Many concurrent runs of one graph keep their state isolated.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_are_isolated() {
    let engine = Arc::new(engine());
    let broadcast = BroadcastListener::new(4096);
    let mut rx = broadcast.subscribe();
    engine.add_event_listener(Arc::new(broadcast));
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("inc", "increment").with_param("count", "$state.count"))
                .edge(EdgeSpec::new("inc", "inc").when(ConditionSpec::new("lt", "count", "$state.limit"))),
        )
        .await
        .unwrap();

    let mut expected = Vec::new();
    // limits stay within the loop guard so every run exits through its condition
    for i in 0..20 {
        let limit = i % 10 + 1;
        let run_id = engine
            .spawn_workflow(&graph_id, map(json!({"count": 0, "limit": limit})))
            .unwrap();
        expected.push((run_id, limit));
    }

    let mut finished = 0;
    tokio::time::timeout(Duration::from_secs(20), async {
        while finished < expected.len() {
            let ev = rx.recv().await.expect("event channel closed");
            if ev.event_type.is_terminal() {
                finished += 1;
            }
        }
    })
    .await
    .expect("runs did not finish in time");

    for (run_id, limit) in expected {
        let run = engine.get_run(&run_id).await.unwrap();
        assert_eq!(run.status, NodeStatus::Completed, "run {}", run_id);
        assert_eq!(run.current_state.data["count"], json!(limit));
    }
}
