//! Process execution tools: `execute-command` and `code-run`.

use crate::backend::CommandOutput;
use crate::error::Error;
use crate::resolver::SandboxResolver;
use crate::tools::traits::{parse_args, Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Render command output the way a shell user expects to read it.
fn format_output(output: &CommandOutput) -> String {
    let mut out = format!("exit_code: {}", output.exit_code);
    if !output.stdout.is_empty() {
        out.push_str(&format!("\n\nstdout:\n{}", output.stdout));
    }
    if !output.stderr.is_empty() {
        out.push_str(&format!("\n\nstderr:\n{}", output.stderr));
    }
    out
}

// ── execute-command ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ExecuteCommandArgs {
    sandbox_id: String,
    command: String,
    cwd: Option<String>,
    timeout_ms: Option<u64>,
}

pub struct ExecuteCommandTool {
    resolver: Arc<SandboxResolver>,
}

impl ExecuteCommandTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute-command"
    }

    fn description(&self) -> &str {
        "Run a shell command inside a sandbox. Returns stdout, stderr, and \
         exit_code. The optional timeout is forwarded to the backend, not \
         enforced locally."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory for the command"
                },
                "timeoutMs": {
                    "type": "integer",
                    "description": "Command timeout in milliseconds, forwarded to the backend"
                }
            },
            "required": ["sandboxId", "command"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: ExecuteCommandArgs = parse_args(args)?;
        if args.command.trim().is_empty() {
            return Err(Error::InvalidInput("command cannot be empty".to_string()));
        }

        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let output = self
            .resolver
            .backend()
            .execute_command(&handle.id, &args.command, args.cwd.as_deref(), args.timeout_ms)
            .await?;
        Ok(ToolResult::text(format_output(&output)))
    }
}

// ── code-run ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CodeRunArgs {
    sandbox_id: String,
    code: String,
    argv: Option<Vec<String>>,
}

pub struct CodeRunTool {
    resolver: Arc<SandboxResolver>,
}

impl CodeRunTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for CodeRunTool {
    fn name(&self) -> &str {
        "code-run"
    }

    fn description(&self) -> &str {
        "Run a code snippet inside a sandbox using the backend's code runner. \
         The language is inferred by the backend from the sandbox image. \
         Returns stdout, stderr, and exit_code."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "code": {
                    "type": "string",
                    "description": "Source code to run"
                },
                "argv": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Arguments passed to the code"
                }
            },
            "required": ["sandboxId", "code"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: CodeRunArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let output = self
            .resolver
            .backend()
            .code_run(&handle.id, &args.code, args.argv.as_deref())
            .await?;
        Ok(ToolResult::text(format_output(&output)))
    }
}
