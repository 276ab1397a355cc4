//! Self-loops, the loop guard and the iteration ceiling.

use serde_json::json;
use toolgraph::{
    ConditionSpec, EdgeSpec, EngineConfig, GraphDefinition, NodeSpec, NodeStatus, StateMap,
    WorkflowEngine,
};

use crate::common::{engine, map, test_tools};

fn self_loop() -> GraphDefinition {
    GraphDefinition::new("count forever")
        .node(NodeSpec::new("inc", "increment").with_param("count", "$state.count"))
        .edge(EdgeSpec::new("inc", "inc").when(ConditionSpec::new("exists", "count", json!(null))))
}

/// **Scenario**: An always-true self-loop runs 10 times, then the loop guard stops it without error.
#[tokio::test]
async fn self_loop_halts_after_guard() {
    let engine = engine();
    let graph_id = engine.create_graph(self_loop()).await.unwrap();

    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();

    assert_eq!(run.status, NodeStatus::Completed);
    assert_eq!(run.node_executions.len(), 10);
    assert!(run.node_executions.iter().all(|e| e.node_id == "inc"));
    assert_eq!(run.current_state.data["count"], json!(10));
}

/// **Scenario**: A bounded loop (refine until count reaches 3) exits through its condition.
#[tokio::test]
async fn bounded_loop_exits_on_condition() {
    let engine = engine();
    let graph_id = engine
        .create_graph(
            GraphDefinition::new("")
                .node(NodeSpec::new("inc", "increment").with_param("count", "$state.count"))
                .node(NodeSpec::new("finish", "done"))
                .edge(EdgeSpec::new("inc", "inc").when(ConditionSpec::new("lt", "count", 3)))
                .edge(EdgeSpec::new("inc", "finish").when(ConditionSpec::new("gte", "count", 3))),
        )
        .await
        .unwrap();

    let run = engine.run_workflow(&graph_id, map(json!({"count": 0}))).await.unwrap();
    let order: Vec<_> = run.node_executions.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(order, vec!["inc", "inc", "inc", "finish"]);
    assert_eq!(run.current_state.data["finish_result"], json!("done"));
}

/// **Scenario**: Re-entering a node appends a new execution record each time.
#[tokio::test]
async fn reentry_appends_records() {
    let engine = engine();
    let graph_id = engine.create_graph(self_loop()).await.unwrap();
    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();
    let counts: Vec<_> = run
        .node_executions
        .iter()
        .map(|e| e.output.as_ref().unwrap()["result"]["count"].clone())
        .collect();
    assert_eq!(counts, (1..=10).map(|n| json!(n)).collect::<Vec<_>>());
}

/// **Scenario**: Engine config can tighten both the loop guard and the ceiling.
#[tokio::test]
async fn config_limits_apply() {
    let engine = std::sync::Arc::new(WorkflowEngine::with_config(
        std::sync::Arc::new(test_tools()),
        EngineConfig {
            loop_guard_iterations: 3,
            ..EngineConfig::default()
        },
    ));
    let graph_id = engine.create_graph(self_loop()).await.unwrap();
    let run = engine.run_workflow(&graph_id, StateMap::new()).await.unwrap();
    assert_eq!(run.node_executions.len(), 3);

    let capped = WorkflowEngine::with_config(
        std::sync::Arc::new(test_tools()),
        EngineConfig {
            max_iterations: 2,
            ..EngineConfig::default()
        },
    );
    let graph_id = capped.create_graph(self_loop()).await.unwrap();
    let run = capped.run_workflow(&graph_id, StateMap::new()).await.unwrap();
    assert_eq!(run.node_executions.len(), 2);
}
