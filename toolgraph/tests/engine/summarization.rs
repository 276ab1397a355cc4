//! The bundled summarization pipelines end to end with the built-in tools.

use std::sync::Arc;

use serde_json::{json, Value};
use toolgraph::workflows::{
    llm_summarization_workflow, sample_llm_summarization_state, sample_summarization_state,
    summarization_workflow, LLM_SUMMARY_TARGET_LENGTH, SUMMARY_LENGTH_LIMIT,
};
use toolgraph::{
    register_llm_tools, register_text_tools, LlmClient, MockLlm, NodeStatus, ToolRegistry,
    WorkflowEngine,
};

fn llm_engine(llm: Option<Arc<dyn LlmClient>>) -> WorkflowEngine {
    let mut tools = ToolRegistry::new();
    register_text_tools(&mut tools);
    register_llm_tools(&mut tools, llm);
    WorkflowEngine::new(Arc::new(tools))
}

/// **Scenario**: The sample text runs through all five nodes and ends within the target length.
#[tokio::test]
async fn summarization_pipeline_completes() {
    let mut tools = ToolRegistry::new();
    register_text_tools(&mut tools);
    let engine = WorkflowEngine::new(Arc::new(tools));
    let graph_id = engine.create_graph(summarization_workflow()).await.unwrap();

    let run = engine
        .run_workflow(&graph_id, sample_summarization_state())
        .await
        .unwrap();

    assert_eq!(run.status, NodeStatus::Completed);
    let order: Vec<_> = run.node_executions.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "split_text",
            "generate_summaries",
            "merge_summaries",
            "refine_summary",
            "quality_check"
        ]
    );
    let data = &run.current_state.data;
    let length = data["summary_length"].as_u64().unwrap();
    assert!(length > 0 && length <= SUMMARY_LENGTH_LIMIT, "length {}", length);
    assert_eq!(data["needs_refinement"], serde_json::json!(false));
    assert!(!data["final_summary"].as_str().unwrap().is_empty());
    assert!(data["split_text_result"].as_array().unwrap().len() >= 2);
}

/// **Scenario**: With no model configured, the LLM pipeline runs on rule-based fallbacks and finishes.
#[tokio::test]
async fn llm_pipeline_falls_back_without_client() {
    let engine = llm_engine(None);
    let graph_id = engine.create_graph(llm_summarization_workflow()).await.unwrap();

    let run = engine
        .run_workflow(&graph_id, sample_llm_summarization_state())
        .await
        .unwrap();

    assert_eq!(run.status, NodeStatus::Completed);
    let order: Vec<_> = run.node_executions.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "split_text",
            "llm_generate_summaries",
            "merge_summaries",
            "llm_refine_summary",
            "quality_check",
            "finish"
        ]
    );
    let data = &run.current_state.data;
    assert_eq!(data["llm_score"], Value::Null);
    assert_eq!(data["llm_assessment"], json!("LLM assessment unavailable"));
    assert_eq!(data["status"], json!("completed"));
    let summary = data["final_summary"].as_str().unwrap();
    assert!(!summary.is_empty());
    assert!(summary.chars().count() as f64 <= LLM_SUMMARY_TARGET_LENGTH as f64 * 1.1);
    assert_eq!(data["split_text_result"].as_array().unwrap().len(), 2);
}

/// **Scenario**: With a model configured, its summary and score drive the pipeline to finish.
#[tokio::test]
async fn llm_pipeline_uses_client() {
    let reply = "1.0 AI reshapes industries, healthcare and finance, and needs ethical rules.";
    let llm = Arc::new(MockLlm::new(reply));
    let engine = llm_engine(Some(llm.clone()));
    let graph_id = engine.create_graph(llm_summarization_workflow()).await.unwrap();

    let run = engine
        .run_workflow(&graph_id, sample_llm_summarization_state())
        .await
        .unwrap();

    assert_eq!(run.status, NodeStatus::Completed);
    let data = &run.current_state.data;
    assert_eq!(data["llm_score"], json!(1.0));
    assert_eq!(data["needs_refinement"], json!(false));
    assert_eq!(data["final_summary"], json!(reply));
    assert_eq!(run.node_executions.last().unwrap().node_id, "finish");
    // Two chunk summaries, one refinement, one assessment.
    assert_eq!(llm.calls(), 4);
}
