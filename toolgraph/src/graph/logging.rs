//! Logging for tool calls, node execution and run lifecycle.
//!
//! Uses `tracing` when the feature is enabled; otherwise writes to stderr.

use crate::error::WorkflowError;
use crate::llm::LlmError;
use crate::tools::ToolError;

pub fn log_tool_registered(name: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(tool = name, "Registered tool");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Registered tool: {}", name);
}

pub fn log_tool_success(name: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(tool = name, "Tool executed successfully");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Tool executed successfully: {}", name);
}

pub fn log_tool_failure(name: &str, error: &ToolError) {
    #[cfg(feature = "tracing")]
    tracing::error!(tool = name, %error, "Tool execution failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] Tool execution failed: {}: {}", name, error);
}

/// No LLM client is configured; `tool` uses its rule-based fallback.
pub fn log_llm_unavailable(tool: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(tool, "No LLM configured, using rule-based fallback");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] No LLM configured for {}, using rule-based fallback", tool);
}

pub fn log_llm_failure(tool: &str, error: &LlmError) {
    #[cfg(feature = "tracing")]
    tracing::warn!(tool, %error, "LLM call failed, using rule-based fallback");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[WARN] LLM call failed in {}: {}, using rule-based fallback", tool, error);
}

/// Log node execution start.
pub fn log_node_start(run_id: &str, node_id: &str, tool: &str) {
    #[cfg(feature = "tracing")]
    tracing::info!(run_id, node_id, tool, "Executing node");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Executing node {} (tool {}) in run {}", node_id, tool, run_id);
}

pub fn log_node_complete(run_id: &str, node_id: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(run_id, node_id, "Node execution complete");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Node execution complete: {} in run {}", node_id, run_id);
}

pub fn log_node_failed(run_id: &str, node_id: &str, error: &WorkflowError) {
    #[cfg(feature = "tracing")]
    tracing::error!(run_id, node_id, %error, "Node execution failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] Node {} failed in run {}: {}", node_id, run_id, error);
}

/// Traversal revisited `node_id` after the loop guard threshold.
pub fn log_loop_guard(run_id: &str, node_id: &str, iterations: usize) {
    #[cfg(feature = "tracing")]
    tracing::warn!(run_id, node_id, iterations, "Loop detected, stopping traversal");

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[WARN] Loop detected at node {} after {} iterations in run {}, stopping",
        node_id, iterations, run_id
    );
}

/// More than one outgoing edge matched; only `chosen` is followed.
pub fn log_multiple_next_nodes(run_id: &str, node_id: &str, candidates: &[String], chosen: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(run_id, node_id, ?candidates, chosen, "Multiple next nodes, taking the first");

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[WARN] Multiple next nodes from {} in run {}: {:?}, taking {}",
        node_id, run_id, candidates, chosen
    );
}

pub fn log_iteration_ceiling(run_id: &str, max_iterations: usize) {
    #[cfg(feature = "tracing")]
    tracing::warn!(run_id, max_iterations, "Iteration ceiling reached, stopping traversal");

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[WARN] Iteration ceiling {} reached in run {}, stopping",
        max_iterations, run_id
    );
}

/// Log graph execution start.
pub fn log_graph_start(run_id: &str, graph_id: &str) {
    #[cfg(feature = "tracing")]
    tracing::info!(run_id, graph_id, "Starting workflow run");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Starting workflow run {} of graph {}", run_id, graph_id);
}

/// Log graph execution completion.
pub fn log_graph_complete(run_id: &str) {
    #[cfg(feature = "tracing")]
    tracing::info!(run_id, "Workflow run completed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Workflow run completed: {}", run_id);
}

/// Log graph execution error.
pub fn log_graph_error(run_id: &str, error: &WorkflowError) {
    #[cfg(feature = "tracing")]
    tracing::error!(run_id, %error, "Workflow run failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] Workflow run {} failed: {}", run_id, error);
}

pub fn log_listener_error(event_type: &str, error: &str) {
    #[cfg(feature = "tracing")]
    tracing::error!(event_type, error, "Event listener failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] Event listener failed on {}: {}", event_type, error);
}

pub fn log_listener_timeout(event_type: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(event_type, "Event listener timed out");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[WARN] Event listener timed out on {}", event_type);
}

/// A store write failed; the run carries on.
pub fn log_store_error(context: &str, id: &str, error: &dyn std::fmt::Display) {
    #[cfg(feature = "tracing")]
    tracing::error!(context, id, %error, "Store operation failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] Store operation {} failed for {}: {}", context, id, error);
}
