//! `create-sandbox` tool — provision a new sandbox on the backend.

use crate::backend::CreateSandboxConfig;
use crate::error::Error;
use crate::resolver::SandboxResolver;
use crate::tools::traits::{parse_args, Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const TOOL_NAME: &str = "create-sandbox";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateSandboxArgs {
    image: Option<String>,
    user: Option<String>,
    env: Option<HashMap<String, String>>,
    labels: Option<HashMap<String, String>>,
    cpu: Option<u32>,
    memory: Option<u32>,
    disk: Option<u32>,
    auto_stop_interval: Option<u32>,
    timeout_ms: Option<u64>,
}

pub struct CreateSandboxTool {
    resolver: Arc<SandboxResolver>,
}

impl CreateSandboxTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for CreateSandboxTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Create a new remote sandbox. All parameters are optional; the backend \
         picks defaults for anything omitted and assigns the sandbox ID. \
         Returns the created sandbox as JSON."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "image": {
                    "type": "string",
                    "description": "Image or snapshot to base the sandbox on"
                },
                "user": {
                    "type": "string",
                    "description": "User to run sandbox processes as"
                },
                "env": {
                    "type": "object",
                    "description": "Environment variables set inside the sandbox",
                    "additionalProperties": {"type": "string"}
                },
                "labels": {
                    "type": "object",
                    "description": "Key/value labels attached to the sandbox",
                    "additionalProperties": {"type": "string"}
                },
                "cpu": {
                    "type": "integer",
                    "description": "CPU cores to allocate"
                },
                "memory": {
                    "type": "integer",
                    "description": "Memory in MiB to allocate"
                },
                "disk": {
                    "type": "integer",
                    "description": "Disk in GiB to allocate"
                },
                "autoStopInterval": {
                    "type": "integer",
                    "description": "Minutes of inactivity before the backend auto-stops the sandbox (0 disables)"
                },
                "timeoutMs": {
                    "type": "integer",
                    "description": "Creation timeout in milliseconds, forwarded to the backend"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: CreateSandboxArgs = parse_args(args)?;
        let config = CreateSandboxConfig {
            image: args.image,
            user: args.user,
            env: args.env,
            labels: args.labels,
            cpu: args.cpu,
            memory: args.memory,
            disk: args.disk,
            auto_stop_interval: args.auto_stop_interval,
            timeout_ms: args.timeout_ms,
        };

        let handle = self.resolver.backend().create(&config).await?;
        ToolResult::json(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::StubBackend;
    use std::time::Duration;

    fn tool() -> CreateSandboxTool {
        let backend = Arc::new(StubBackend::default());
        let resolver = Arc::new(SandboxResolver::new(backend, Duration::from_secs(30)));
        CreateSandboxTool::new(resolver)
    }

    #[test]
    fn tool_name() {
        assert_eq!(tool().name(), TOOL_NAME);
    }

    #[tokio::test]
    async fn creates_sandbox_with_defaults() {
        let result = tool().execute(json!({})).await.unwrap();
        assert!(result.output.contains("sb-created"));
    }

    #[tokio::test]
    async fn unknown_field_is_invalid_input_before_any_backend_call() {
        let backend = Arc::new(StubBackend::default());
        let resolver = Arc::new(SandboxResolver::new(backend.clone(), Duration::from_secs(30)));
        let tool = CreateSandboxTool::new(resolver);

        let err = tool.execute(json!({"badField": 1})).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(backend.handles.lock().is_empty());
    }
}
