//! Tools: named async callables invoked by graph nodes.
//!
//! Every tool is called through [`Tool::call`] with keyword arguments as a JSON object, so
//! callers never branch on whether a tool suspends. [`ToolRegistry`] resolves names; the
//! `is_async` flag survives only as metadata for listings.

mod args;
mod error;
mod function;
pub mod llm;
mod registry;
pub mod text;
mod r#trait;

pub use args::ToolArgs;
pub use error::ToolError;
pub use function::{AsyncFnTool, FnTool};
pub use r#trait::Tool;
pub use llm::register_llm_tools;
pub use registry::{ToolInfo, ToolRegistry};
pub use text::register_text_tools;
