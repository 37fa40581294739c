//! Sandbox lifecycle tools: get, list, start, stop, remove.

use crate::error::Error;
use crate::resolver::SandboxResolver;
use crate::tools::traits::{parse_args, Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

fn sandbox_id_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "sandboxId": {
                "type": "string",
                "description": "Identifier of the target sandbox"
            }
        },
        "required": ["sandboxId"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SandboxIdArgs {
    sandbox_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SandboxIdTimeoutArgs {
    sandbox_id: String,
    timeout_ms: Option<u64>,
}

// ── get-sandbox ───────────────────────────────────────────────────────────────

pub struct GetSandboxTool {
    resolver: Arc<SandboxResolver>,
}

impl GetSandboxTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GetSandboxTool {
    fn name(&self) -> &str {
        "get-sandbox"
    }

    fn description(&self) -> &str {
        "Get details of a sandbox by ID (state, image, timestamps). Returns JSON."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        sandbox_id_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SandboxIdArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        ToolResult::json(&handle)
    }
}

// ── list-sandboxes ────────────────────────────────────────────────────────────

pub struct ListSandboxesTool {
    resolver: Arc<SandboxResolver>,
}

impl ListSandboxesTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ListSandboxesTool {
    fn name(&self) -> &str {
        "list-sandboxes"
    }

    fn description(&self) -> &str {
        "List all sandboxes visible to the configured credentials. Returns JSON."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}, "required": []})
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        // No arguments accepted; anything present is a caller mistake.
        let _: NoArgs = parse_args(args)?;
        let handles = self.resolver.backend().list().await?;
        ToolResult::json(&json!({
            "sandboxes": handles,
            "total": handles.len(),
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

// ── start-sandbox ─────────────────────────────────────────────────────────────

pub struct StartSandboxTool {
    resolver: Arc<SandboxResolver>,
}

impl StartSandboxTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for StartSandboxTool {
    fn name(&self) -> &str {
        "start-sandbox"
    }

    fn description(&self) -> &str {
        "Start a stopped sandbox. Optionally pass timeoutMs, forwarded to the backend."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "timeoutMs": {
                    "type": "integer",
                    "description": "Start timeout in milliseconds, forwarded to the backend"
                }
            },
            "required": ["sandboxId"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SandboxIdTimeoutArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let started = self
            .resolver
            .backend()
            .start(&handle.id, args.timeout_ms)
            .await?;
        ToolResult::json(&started)
    }
}

// ── stop-sandbox ──────────────────────────────────────────────────────────────

pub struct StopSandboxTool {
    resolver: Arc<SandboxResolver>,
}

impl StopSandboxTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for StopSandboxTool {
    fn name(&self) -> &str {
        "stop-sandbox"
    }

    fn description(&self) -> &str {
        "Stop a running sandbox. The sandbox can be started again later."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        sandbox_id_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SandboxIdArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver.backend().stop(&handle.id).await?;
        Ok(ToolResult::text(format!("Sandbox {} stopped.", handle.id)))
    }
}

// ── remove-sandbox ────────────────────────────────────────────────────────────

pub struct RemoveSandboxTool {
    resolver: Arc<SandboxResolver>,
}

impl RemoveSandboxTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for RemoveSandboxTool {
    fn name(&self) -> &str {
        "remove-sandbox"
    }

    fn description(&self) -> &str {
        "Permanently remove a sandbox and everything inside it. \
         Optionally pass timeoutMs, forwarded to the backend."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the sandbox to remove"
                },
                "timeoutMs": {
                    "type": "integer",
                    "description": "Removal timeout in milliseconds, forwarded to the backend"
                }
            },
            "required": ["sandboxId"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SandboxIdTimeoutArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .remove(&handle.id, args.timeout_ms)
            .await?;
        Ok(ToolResult::text(format!("Sandbox {} removed.", handle.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::StubBackend;
    use std::time::Duration;

    fn resolver(backend: Arc<StubBackend>) -> Arc<SandboxResolver> {
        Arc::new(SandboxResolver::new(backend, Duration::from_secs(30)))
    }

    #[test]
    fn tool_names() {
        let backend = Arc::new(StubBackend::default());
        let r = resolver(backend);
        assert_eq!(GetSandboxTool::new(r.clone()).name(), "get-sandbox");
        assert_eq!(ListSandboxesTool::new(r.clone()).name(), "list-sandboxes");
        assert_eq!(StartSandboxTool::new(r.clone()).name(), "start-sandbox");
        assert_eq!(StopSandboxTool::new(r.clone()).name(), "stop-sandbox");
        assert_eq!(RemoveSandboxTool::new(r).name(), "remove-sandbox");
    }

    #[tokio::test]
    async fn get_returns_handle_json() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = GetSandboxTool::new(resolver(backend));
        let result = tool.execute(json!({"sandboxId": "sb1"})).await.unwrap();
        assert!(result.output.contains("\"sb1\""));
    }

    #[tokio::test]
    async fn get_missing_sandbox_is_not_found_kind() {
        let backend = Arc::new(StubBackend::default());
        let tool = GetSandboxTool::new(resolver(backend));
        let err = tool.execute(json!({"sandboxId": "missing"})).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn get_requires_sandbox_id() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = GetSandboxTool::new(resolver(backend));
        let err = tool.execute(json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn list_reports_total() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = ListSandboxesTool::new(resolver(backend));
        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.output.contains("\"total\": 1"));
    }

    #[tokio::test]
    async fn remove_deletes_from_backend() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = RemoveSandboxTool::new(resolver(backend.clone()));
        tool.execute(json!({"sandboxId": "sb1"})).await.unwrap();
        assert!(backend.handles.lock().is_empty());
    }
}
