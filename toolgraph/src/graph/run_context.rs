//! Collaborators a graph needs while executing one run.

use crate::engine::EngineConfig;
use crate::event::EventSink;
use crate::tools::ToolRegistry;

/// Borrowed per-run context: tools to call, where to send events, and traversal limits.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub tools: &'a ToolRegistry,
    pub events: &'a dyn EventSink,
    pub config: &'a EngineConfig,
}

impl<'a> RunContext<'a> {
    pub fn new(tools: &'a ToolRegistry, events: &'a dyn EventSink, config: &'a EngineConfig) -> Self {
        Self {
            tools,
            events,
            config,
        }
    }
}
