//! Tool error types.

use thiserror::Error;

/// Error returned by a tool call or registry lookup.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under this name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Arguments missing or of the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tool ran and failed.
    #[error("execution failed: {0}")]
    Execution(String),
}
