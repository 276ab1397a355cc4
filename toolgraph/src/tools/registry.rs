//! Tool registry: name → tool lookup and invoke-by-name.
//!
//! Built explicitly at startup, then shared read-only (typically as `Arc<ToolRegistry>`)
//! with the engine and the transport layer.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Tool, ToolArgs, ToolError};
use crate::graph::logging;

/// Listing metadata for one registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub description: String,
    pub is_async: bool,
    pub available: bool,
}

/// Registry of tools keyed by name. Registering an existing name replaces it.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under its own name. Returns `&mut Self` for chaining.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name().to_string();
        logging::log_tool_registered(&name);
        self.tools.insert(name, tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Calls the tool registered as `name` with keyword arguments `args`.
    ///
    /// Returns [`ToolError::NotFound`] when unregistered; otherwise the tool's own result.
    /// A panicking tool is reported as [`ToolError::Execution`].
    pub async fn execute(&self, name: &str, args: ToolArgs) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let result = AssertUnwindSafe(tool.call(args))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ToolError::Execution(format!(
                    "tool panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });
        match &result {
            Ok(_) => logging::log_tool_success(name),
            Err(e) => logging::log_tool_failure(name, e),
        }
        result
    }

    /// All registered tools with their metadata, sorted by name.
    pub fn get_tools(&self) -> BTreeMap<String, ToolInfo> {
        self.tools
            .iter()
            .map(|(name, tool)| {
                (
                    name.clone(),
                    ToolInfo {
                        description: tool.description().to_string(),
                        is_async: tool.is_async(),
                        available: true,
                    },
                )
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
