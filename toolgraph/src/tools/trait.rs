//! Tool trait: one uniform, suspendable call contract.

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolArgs, ToolError};

/// A named callable that a node invokes with resolved params as keyword arguments.
///
/// Implementations that never suspend still implement `call` as `async`; the engine
/// treats every tool the same way.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry key; node specs refer to tools by this name.
    fn name(&self) -> &str;

    /// Human-readable description for tool listings.
    fn description(&self) -> &str {
        ""
    }

    /// Whether the tool does real asynchronous work. Listing metadata only.
    fn is_async(&self) -> bool {
        false
    }

    /// Invokes the tool. A JSON object result is merged into run state by the caller;
    /// any other value is stored under `<node_id>_result`.
    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError>;
}
