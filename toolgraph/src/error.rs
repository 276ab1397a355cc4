//! Workflow error types.
//!
//! Returned by graph construction, traversal and the engine. Tool failures are
//! wrapped at the node boundary; store failures only surface from explicit
//! store calls (the engine logs checkpoint failures instead of failing a run).

use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;
use crate::tools::ToolError;

/// Error raised while building or executing a workflow graph.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed graph, node or edge spec. Raised at construction, never during a run.
    #[error("invalid workflow definition: {0}")]
    Definition(String),

    /// No graph is registered under this id.
    #[error("graph {0} not found")]
    GraphNotFound(String),

    /// Traversal reached a node id that the graph does not contain.
    #[error("node {0} not found")]
    NodeNotFound(String),

    /// A node names a tool that is not registered.
    #[error("tool '{0}' not found in registry")]
    ToolNotFound(String),

    /// The tool itself failed; fatal to the containing run.
    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// The graph has no nodes and no explicit start node.
    #[error("no start node defined")]
    NoStartNode,

    /// An ordering condition compared values that have no common order (e.g. string vs number).
    #[error("cannot order '{key}' = {actual} against {expected}")]
    IncomparableValues {
        key: String,
        actual: Value,
        expected: Value,
    },

    /// Explicit store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// Maps a registry/tool failure for `tool` into the workflow taxonomy.
    pub fn from_tool(tool: &str, err: ToolError) -> Self {
        match err {
            ToolError::NotFound(name) => WorkflowError::ToolNotFound(name),
            other => WorkflowError::ToolExecution {
                tool: tool.to_string(),
                message: other.to_string(),
            },
        }
    }
}
