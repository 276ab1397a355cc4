//! Closure adapters so plain functions register as [`Tool`]s.
//!
//! [`FnTool`] wraps a synchronous closure, [`AsyncFnTool`] one returning a boxed future.
//! Both are called through the same `Tool::call`.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use super::{Tool, ToolArgs, ToolError};

/// Tool backed by a synchronous closure.
pub struct FnTool<F> {
    name: String,
    description: String,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(ToolArgs) -> Result<Value, ToolError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(ToolArgs) -> Result<Value, ToolError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError> {
        (self.func)(args)
    }
}

/// Tool backed by a closure returning a boxed future; reported as async in listings.
pub struct AsyncFnTool<F> {
    name: String,
    description: String,
    func: F,
}

impl<F> AsyncFnTool<F>
where
    F: Fn(ToolArgs) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Tool for AsyncFnTool<F>
where
    F: Fn(ToolArgs) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError> {
        (self.func)(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    /// **Scenario**: A sync closure tool returns its closure's value and reports is_async = false.
    #[tokio::test]
    async fn fn_tool_calls_closure() {
        let tool = FnTool::new("echo", "Echo args", |args: ToolArgs| Ok(Value::Object(args)));
        let out = tool
            .call(json!({"a": 1}).as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(out, json!({"a": 1}));
        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.description(), "Echo args");
        assert!(!tool.is_async());
    }

    /// **Scenario**: An async closure tool is awaited through the same call and reports is_async = true.
    #[tokio::test]
    async fn async_fn_tool_awaits_future() {
        let tool = AsyncFnTool::new("later", "", |_args: ToolArgs| {
            async move {
                tokio::task::yield_now().await;
                Ok(json!("done"))
            }
            .boxed()
        });
        assert_eq!(tool.call(ToolArgs::new()).await.unwrap(), json!("done"));
        assert!(tool.is_async());
    }
}
