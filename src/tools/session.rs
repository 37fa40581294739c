//! Exec session tools: create, execute, delete, list.
//!
//! Sessions are long-lived shells inside a sandbox; commands run in one share
//! environment and working directory across calls.

use crate::error::Error;
use crate::resolver::SandboxResolver;
use crate::tools::traits::{parse_args, Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SessionArgs {
    sandbox_id: String,
    session_id: String,
}

fn session_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "sandboxId": {
                "type": "string",
                "description": "Identifier of the target sandbox"
            },
            "sessionId": {
                "type": "string",
                "description": "Caller-chosen session identifier"
            }
        },
        "required": ["sandboxId", "sessionId"]
    })
}

// ── create-session ────────────────────────────────────────────────────────────

pub struct CreateSessionTool {
    resolver: Arc<SandboxResolver>,
}

impl CreateSessionTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for CreateSessionTool {
    fn name(&self) -> &str {
        "create-session"
    }

    fn description(&self) -> &str {
        "Create a long-lived exec session in a sandbox. Commands executed in \
         the session share environment and working directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        session_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SessionArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .create_session(&handle.id, &args.session_id)
            .await?;
        Ok(ToolResult::text(format!(
            "Session {} created in sandbox {}.",
            args.session_id, handle.id
        )))
    }
}

// ── execute-session-command ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ExecuteSessionCommandArgs {
    sandbox_id: String,
    session_id: String,
    command: String,
    #[serde(default)]
    run_async: bool,
}

pub struct ExecuteSessionCommandTool {
    resolver: Arc<SandboxResolver>,
}

impl ExecuteSessionCommandTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ExecuteSessionCommandTool {
    fn name(&self) -> &str {
        "execute-session-command"
    }

    fn description(&self) -> &str {
        "Run a command inside an existing exec session. Pass runAsync=true to \
         return immediately with a command ID instead of waiting for completion."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "sessionId": {
                    "type": "string",
                    "description": "Session to run the command in"
                },
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                },
                "runAsync": {
                    "type": "boolean",
                    "description": "Do not wait for completion. Default: false."
                }
            },
            "required": ["sandboxId", "sessionId", "command"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: ExecuteSessionCommandArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let output = self
            .resolver
            .backend()
            .execute_session_command(&handle.id, &args.session_id, &args.command, args.run_async)
            .await?;
        ToolResult::json(&output)
    }
}

// ── delete-session ────────────────────────────────────────────────────────────

pub struct DeleteSessionTool {
    resolver: Arc<SandboxResolver>,
}

impl DeleteSessionTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for DeleteSessionTool {
    fn name(&self) -> &str {
        "delete-session"
    }

    fn description(&self) -> &str {
        "Delete an exec session and terminate anything still running in it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        session_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SessionArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .delete_session(&handle.id, &args.session_id)
            .await?;
        Ok(ToolResult::text(format!(
            "Session {} deleted.",
            args.session_id
        )))
    }
}

// ── list-sessions ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ListSessionsArgs {
    sandbox_id: String,
}

pub struct ListSessionsTool {
    resolver: Arc<SandboxResolver>,
}

impl ListSessionsTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ListSessionsTool {
    fn name(&self) -> &str {
        "list-sessions"
    }

    fn description(&self) -> &str {
        "List exec sessions in a sandbox, including their command history. Returns JSON."
    }

    fn parameters_schema(&self) -> serde_json::Value {
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

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: ListSessionsArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let sessions = self.resolver.backend().list_sessions(&handle.id).await?;
        ToolResult::json(&json!({
            "sessions": sessions,
            "total": sessions.len(),
        }))
    }
}
