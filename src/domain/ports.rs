//! Ports for the execution surface being governed.
//!
//! The governor never inspects tool semantics; a tool is an opaque handler
//! keyed by name. Hosts register implementations of [`ToolHandler`] with the
//! enforcement boundary, which consults the kernel before every invocation.

use async_trait::async_trait;
use serde_json::Value;

/// Port trait for a governed tool.
///
/// Implementations perform the actual side effect. They run only after the
/// kernel has emitted GO for the step; errors they raise are reported
/// upstream unchanged and never swallowed by the governor.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the given parameters.
    async fn call(&self, params: Value) -> anyhow::Result<Value>;
}

/// Adapter turning a plain closure into a [`ToolHandler`].
///
/// Convenient for tests and for hosts whose tools are synchronous.
pub struct FnTool<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    /// Wrap a closure as a tool handler.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> ToolHandler for FnTool<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    async fn call(&self, params: Value) -> anyhow::Result<Value> {
        (self.func)(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_tool_passes_params_through() {
        let tool = FnTool::new(|params| Ok(json!({ "echo": params })));
        let out = tool.call(json!({"a": 1})).await.unwrap();
        assert_eq!(out, json!({ "echo": {"a": 1} }));
    }

    #[tokio::test]
    async fn test_fn_tool_propagates_errors() {
        let tool = FnTool::new(|_| anyhow::bail!("upstream exploded"));
        let err = tool.call(Value::Null).await.unwrap_err();
        assert!(err.to_string().contains("upstream exploded"));
    }
}
