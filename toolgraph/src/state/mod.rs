//! Run-scoped data: the state threaded through a graph and the run record around it.
//!
//! [`WorkflowState`] is owned by exactly one [`WorkflowRun`]; the engine shares a live
//! run between its executing task and status readers as a [`SharedRun`].

mod run;
mod workflow_state;

pub use run::{NodeExecution, NodeStatus, SharedRun, WorkflowRun};
pub use workflow_state::{StateMap, WorkflowState};
