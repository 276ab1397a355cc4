//! Workflow graph: declarative definition, conditions, parameter resolution and traversal.
//!
//! A [`GraphDefinition`] is validated into a [`WorkflowGraph`] once; the graph is then
//! immutable and shared by every run of it.

mod condition;
mod definition;
pub mod logging;
mod params;
mod run_context;
mod workflow_graph;

pub use condition::{evaluate_condition, Condition, ConditionType, STATE_REF_PREFIX};
pub use definition::{ConditionSpec, EdgeSpec, GraphDefinition, NodeSpec};
pub use params::{resolve_params, resolve_value};
pub use run_context::RunContext;
pub use workflow_graph::{Edge, Node, WorkflowGraph};
