//! Traversal limits and listener timeout.

use std::time::Duration;

/// Limits applied to every run of an engine.
///
/// **Interaction**: Read by `WorkflowGraph::execute` through `RunContext`, and by the
/// engine's `EventBus` for the per-listener timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Hard cap on node executions per run.
    pub max_iterations: usize,
    /// Revisiting a node stops traversal once more than this many steps have run.
    pub loop_guard_iterations: usize,
    /// Longest a single listener may take for one event before it is skipped.
    pub listener_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            loop_guard_iterations: 10,
            listener_timeout: Duration::from_secs(5),
        }
    }
}
