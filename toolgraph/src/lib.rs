//! # toolgraph
//!
//! A small workflow engine: directed graphs whose nodes call named tools, threading one
//! shared JSON state through the run and routing on state-dependent edge conditions.
//!
//! ## Design Principles
//!
//! - **Declarative graphs**: A [`GraphDefinition`] (nodes, edges, start node) is validated
//!   once into an immutable [`WorkflowGraph`].
//! - **One path at a time**: A run executes one node at a time; when several edges apply,
//!   the first in definition order wins.
//! - **Failure is data**: A failed run stays queryable with `status = failed` and `error` set.
//! - **No globals**: [`ToolRegistry`] and [`WorkflowEngine`] are constructed explicitly and
//!   shared by `Arc`.
//!
//! ## Main Modules
//!
//! - [`graph`]: `GraphDefinition`, `WorkflowGraph`, `Condition`, parameter resolution.
//! - [`engine`]: `WorkflowEngine`, `EngineConfig`: run creation, execution and lookup.
//! - [`state`]: `WorkflowState`, `WorkflowRun`, `NodeExecution`, `NodeStatus`.
//! - [`tools`]: `Tool` trait, closure adapters, `ToolRegistry`, built-in text and LLM tools.
//! - [`llm`]: `LlmClient` seam for the LLM tools, `ChatOpenAI`, `MockLlm`.
//! - [`event`]: `WorkflowEvent`, `EventBus`, listeners.
//! - [`store`]: `WorkflowStore` with in-memory and SQLite implementations.
//! - [`workflows`]: bundled definitions: the rule-based and LLM summarization pipelines.
//!
//! ## Features
//!
//! - `sqlite` (default): `SqliteWorkflowStore`.
//! - `tracing` (default): structured logs via `tracing`; stderr otherwise.
//! - `openai`: `ChatOpenAI` over `async-openai`; without it the LLM tools always use their
//!   rule-based fallbacks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use toolgraph::{EdgeSpec, FnTool, GraphDefinition, NodeSpec, StateMap, ToolRegistry, WorkflowEngine};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut tools = ToolRegistry::new();
//! tools.register(FnTool::new("greet", "Say hello", |args| {
//!     Ok(json!(format!("hello {}", args["name"])))
//! }));
//! let engine = WorkflowEngine::new(Arc::new(tools));
//!
//! let graph_id = engine
//!     .create_graph(
//!         GraphDefinition::new("hello")
//!             .node(NodeSpec::new("greet", "greet").with_param("name", "$state.name")),
//!     )
//!     .await
//!     .unwrap();
//! let mut state = StateMap::new();
//! state.insert("name".into(), json!("world"));
//! let run = engine.run_workflow(&graph_id, state).await.unwrap();
//! println!("{}", run.current_state.data["greet_result"]);
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod graph;
pub mod llm;
pub mod state;
pub mod store;
pub mod tools;
pub mod workflows;

pub use engine::{EngineConfig, WorkflowEngine};
pub use error::WorkflowError;
pub use event::{
    BroadcastListener, EventBus, EventListener, EventSink, EventType, FnListener, ListenerError,
    WorkflowEvent,
};
pub use graph::{ConditionSpec, EdgeSpec, GraphDefinition, NodeSpec, WorkflowGraph};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use llm::{llm_from_env, LlmClient, LlmConfig, LlmError, MockLlm};
pub use state::{NodeExecution, NodeStatus, SharedRun, StateMap, WorkflowRun, WorkflowState};
pub use store::{GraphSummary, InMemoryWorkflowStore, RunSummary, StoreError, WorkflowStore};
#[cfg(feature = "sqlite")]
pub use store::SqliteWorkflowStore;
pub use tools::{
    register_llm_tools, register_text_tools, AsyncFnTool, FnTool, Tool, ToolError, ToolInfo,
    ToolRegistry,
};
