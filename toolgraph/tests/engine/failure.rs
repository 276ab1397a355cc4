//! Tool failures, missing tools and missing graphs.

use std::sync::Arc;
use std::time::Duration;

use toolgraph::{
    BroadcastListener, EdgeSpec, EventType, FnTool, GraphDefinition, NodeSpec, NodeStatus,
    StateMap, WorkflowEngine, WorkflowError,
};

use crate::common::{engine, record_events, test_tools};

fn failing_graph() -> GraphDefinition {
    GraphDefinition::new("fails in the middle")
        .node(NodeSpec::new("A", "returns_x"))
        .node(NodeSpec::new("N", "explode"))
        .node(NodeSpec::new("C", "done"))
        .edge(EdgeSpec::new("A", "N"))
        .edge(EdgeSpec::new("N", "C"))
}

/// **Scenario**: A failure at N fails the run, records N as failed, and nothing after N runs.
#[tokio::test]
async fn tool_failure_aborts_run() {
    let engine = engine();
    let seen = record_events(&engine);
    let graph_id = engine.create_graph(failing_graph()).await.unwrap();

    let err = engine
        .run_workflow(&graph_id, StateMap::new())
        .await
        .unwrap_err();
    match &err {
        WorkflowError::ToolExecution { tool, message } => {
            assert_eq!(tool, "explode");
            assert!(message.contains("kaboom"), "{}", message);
        }
        other => panic!("expected ToolExecution, got {:?}", other),
    }

    let runs = engine.list_runs(Some(&graph_id)).await;
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.status, NodeStatus::Failed);
    assert!(run.error.as_deref().unwrap().contains("kaboom"));
    assert!(run.completed_at.is_some());
    let records: Vec<_> = run
        .node_executions
        .iter()
        .map(|e| (e.node_id.as_str(), e.status))
        .collect();
    assert_eq!(records, vec![("A", NodeStatus::Completed), ("N", NodeStatus::Failed)]);
    assert!(run.node_executions[1].error.is_some());
    assert_eq!(run.current_node.as_deref(), Some("N"));

    let events = seen.lock().unwrap().clone();
    let tail: Vec<_> = events.iter().rev().take(2).map(|e| e.event_type).collect();
    assert_eq!(tail, vec![EventType::WorkflowFailed, EventType::NodeFailed]);
    assert!(events.last().unwrap().data["error"]
        .as_str()
        .unwrap()
        .contains("kaboom"));
}

/// **Scenario**: A node naming an unregistered tool fails the run with ToolNotFound.
#[tokio::test]
async fn unknown_tool_fails_run() {
    let engine = engine();
    let graph_id = engine
        .create_graph(GraphDefinition::new("").node(NodeSpec::new("A", "no_such_tool")))
        .await
        .unwrap();
    let err = engine
        .run_workflow(&graph_id, StateMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ToolNotFound(ref t) if t == "no_such_tool"));
    let run = &engine.list_runs(None).await[0];
    assert_eq!(run.status, NodeStatus::Failed);
    assert_eq!(run.node_executions[0].status, NodeStatus::Failed);
}

/// **Scenario**: Running an unknown graph fails with GraphNotFound and registers no run.
#[tokio::test]
async fn unknown_graph_is_rejected() {
    let engine = engine();
    let err = engine
        .run_workflow("missing", StateMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::GraphNotFound(ref g) if g == "missing"));
    assert!(engine.list_runs(None).await.is_empty());
}

/// **Scenario**: A graph with no nodes fails its run with NoStartNode.
#[tokio::test]
async fn empty_graph_fails_with_no_start_node() {
    let engine = engine();
    let graph_id = engine.create_graph(GraphDefinition::new("empty")).await.unwrap();
    let err = engine
        .run_workflow(&graph_id, StateMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NoStartNode));
    assert_eq!(engine.list_runs(None).await[0].status, NodeStatus::Failed);
}

/// **Scenario**: A condition comparing a string with a number fails the run loudly.
#[tokio::test]
async fn incomparable_condition_fails_run() {
    let engine = engine();
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("A", "echo").with_param("level", "high"))
                .node(NodeSpec::new("B", "done"))
                .edge(EdgeSpec::new("A", "B").when(toolgraph::ConditionSpec::new("gt", "level", 3))),
        )
        .await
        .unwrap();
    let err = engine
        .run_workflow(&graph_id, StateMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::IncomparableValues { .. }));
}

/// **Scenario**: A tool that panics inside a spawned run fails the run instead of leaving it running.
#[tokio::test]
async fn panicking_tool_fails_spawned_run() {
    let mut tools = test_tools();
    tools.register(FnTool::new("boom", "", |_| panic!("tool bug")));
    let engine = Arc::new(WorkflowEngine::new(Arc::new(tools)));
    let broadcast = BroadcastListener::default();
    let mut rx = broadcast.subscribe();
    engine.add_event_listener(Arc::new(broadcast));
    let graph_id = engine
        .create_graph(GraphDefinition::new("").node(NodeSpec::new("A", "boom")))
        .await
        .unwrap();

    let run_id = engine.spawn_workflow(&graph_id, StateMap::new()).unwrap();
    let mut types = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let ev = rx.recv().await.expect("event channel closed");
            if ev.run_id() == Some(run_id.as_str()) {
                types.push(ev.event_type);
                if ev.event_type.is_terminal() {
                    break;
                }
            }
        }
    })
    .await
    .expect("run did not finish in time");

    assert_eq!(
        types,
        vec![
            EventType::WorkflowStarted,
            EventType::NodeStarted,
            EventType::NodeFailed,
            EventType::WorkflowFailed,
        ]
    );
    let run = engine.get_run(&run_id).await.unwrap();
    assert_eq!(run.status, NodeStatus::Failed);
    assert!(run.error.as_deref().unwrap().contains("tool bug"));
    assert_eq!(run.node_executions[0].status, NodeStatus::Failed);
}
