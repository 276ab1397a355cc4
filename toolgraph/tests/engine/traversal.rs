//! End-to-end runs over linear and conditional graphs.

use serde_json::json;
use toolgraph::{ConditionSpec, EdgeSpec, EventType, GraphDefinition, NodeSpec, NodeStatus, StateMap};

use crate::common::{engine, map, record_events};

/// **Scenario**: A→B, A returns {"x":1}, B returns "done": state is {"x":1,"B_result":"done"}.
#[tokio::test]
async fn linear_graph_merges_objects_and_stores_scalars() {
    let engine = engine();
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("a then b")
                .node(NodeSpec::new("A", "returns_x"))
                .node(NodeSpec::new("B", "done"))
                .edge(EdgeSpec::new("A", "B")),
        )
        .await
        .unwrap();

    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();

    assert_eq!(run.current_state.data, map(json!({"x": 1, "B_result": "done"})));
    assert_eq!(run.node_executions.len(), 2);
    assert!(run
        .node_executions
        .iter()
        .all(|e| e.status == NodeStatus::Completed));
    assert_eq!(run.node_executions[1].output, Some(map(json!({"result": "done"}))));
    assert_eq!(run.status, NodeStatus::Completed);
    assert!(run.completed_at.is_some());
    assert!(run.initial_state.data.is_empty());
}

/// **Scenario**: An exists-condition that never holds stops after A; the run still completes.
#[tokio::test]
async fn unmatched_condition_ends_run_normally() {
    let engine = engine();
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("A", "returns_x"))
                .node(NodeSpec::new("B", "done"))
                .edge(EdgeSpec::new("A", "B").when(ConditionSpec::new("exists", "y", json!(null)))),
        )
        .await
        .unwrap();

    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();

    assert_eq!(run.node_executions.len(), 1);
    assert_eq!(run.node_executions[0].node_id, "A");
    assert_eq!(run.current_node.as_deref(), Some("A"));
    assert_eq!(run.status, NodeStatus::Completed);
}

/// **Scenario**: The explicit start node runs first and current_node ends on the last node run.
#[tokio::test]
async fn start_node_first_and_current_node_last() {
    let engine = engine();
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("first_listed", "done"))
                .node(NodeSpec::new("entry", "returns_x"))
                .edge(EdgeSpec::new("entry", "first_listed"))
                .start_at("entry"),
        )
        .await
        .unwrap();

    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();
    let order: Vec<_> = run.node_executions.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(order, vec!["entry", "first_listed"]);
    assert_eq!(run.current_node.as_deref(), Some("first_listed"));
}

/// **Scenario**: `$state.x` params pass state["x"]; a missing key passes null.
#[tokio::test]
async fn params_resolve_from_current_state() {
    let engine = engine();
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("").node(
                NodeSpec::new("E", "echo")
                    .with_param("copied", "$state.x")
                    .with_param("missing", "$state.nope")
                    .with_param("literal", 3),
            ),
        )
        .await
        .unwrap();

    let run = engine
        .run_workflow(&graph_id, map(json!({"x": "v"})))
        .await
        .unwrap();
    let result = run.node_executions[0].output.as_ref().unwrap()["result"].clone();
    assert_eq!(result, json!({"copied": "v", "missing": null, "literal": 3}));
}

/// **Scenario**: Conditional routing on a `$state.` threshold picks the matching branch.
#[tokio::test]
async fn routes_on_state_referenced_threshold() {
    let engine = engine();
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("start", "echo"))
                .node(NodeSpec::new("high", "done"))
                .node(NodeSpec::new("low", "done"))
                .edge(EdgeSpec::new("start", "high").when(ConditionSpec::new("gt", "score", "$state.threshold")))
                .edge(EdgeSpec::new("start", "low").when(ConditionSpec::new("lte", "score", "$state.threshold"))),
        )
        .await
        .unwrap();

    let high = engine
        .run_workflow(&graph_id, map(json!({"score": 9, "threshold": 5})))
        .await
        .unwrap();
    assert_eq!(high.current_node.as_deref(), Some("high"));

    let low = engine
        .run_workflow(&graph_id, map(json!({"score": 2, "threshold": 5})))
        .await
        .unwrap();
    assert_eq!(low.current_node.as_deref(), Some("low"));

    // no threshold: neither ordering edge applies
    let neither = engine
        .run_workflow(&graph_id, map(json!({"score": 2})))
        .await
        .unwrap();
    assert_eq!(neither.current_node.as_deref(), Some("start"));
}

/// **Scenario**: A successful run emits workflow_started, node events, then workflow_completed.
#[tokio::test]
async fn event_sequence_for_successful_run() {
    let engine = engine();
    let seen = record_events(&engine);
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("A", "returns_x"))
                .node(NodeSpec::new("B", "done"))
                .edge(EdgeSpec::new("A", "B")),
        )
        .await
        .unwrap();
    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();

    let events = seen.lock().unwrap().clone();
    let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        kinds,
        vec![
            EventType::WorkflowStarted,
            EventType::NodeStarted,
            EventType::NodeCompleted,
            EventType::NodeStarted,
            EventType::NodeCompleted,
            EventType::WorkflowCompleted,
        ]
    );
    assert!(events.iter().all(|e| e.run_id() == Some(run.run_id.as_str())));
    assert_eq!(events[0].data["graph_id"], json!(graph_id));
    assert_eq!(events[4].data["result"], json!("done"));
    assert_eq!(events[5].data["status"], json!("completed"));
}
