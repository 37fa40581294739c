//! Sandbox filesystem tools: list, folder/file management, search, replace,
//! permissions, and base64 upload/download.

use crate::error::Error;
use crate::resolver::SandboxResolver;
use crate::tools::traits::{parse_args, Tool, ToolResult};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

fn sandbox_path_schema(path_description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "sandboxId": {
                "type": "string",
                "description": "Identifier of the target sandbox"
            },
            "path": {
                "type": "string",
                "description": path_description
            }
        },
        "required": ["sandboxId", "path"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SandboxPathArgs {
    sandbox_id: String,
    path: String,
}

// ── list-files ────────────────────────────────────────────────────────────────

pub struct ListFilesTool {
    resolver: Arc<SandboxResolver>,
}

impl ListFilesTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list-files"
    }

    fn description(&self) -> &str {
        "List files and directories at a path in the sandbox. \
         Returns entries with names, types, and sizes."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        sandbox_path_schema("Directory path to list")
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SandboxPathArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let entries = self
            .resolver
            .backend()
            .list_files(&handle.id, &args.path)
            .await?;

        let mut lines = vec![format!("Files in {}:", args.path)];
        for entry in &entries {
            let kind = if entry.is_dir { "dir" } else { "file" };
            match entry.size {
                Some(size) if !entry.is_dir => {
                    lines.push(format!("  [{kind}] {} ({size} bytes)", entry.name))
                }
                _ => lines.push(format!("  [{kind}] {}", entry.name)),
            }
        }
        Ok(ToolResult::text(lines.join("\n")))
    }
}

// ── create-folder ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateFolderArgs {
    sandbox_id: String,
    path: String,
    mode: Option<String>,
}

pub struct CreateFolderTool {
    resolver: Arc<SandboxResolver>,
}

impl CreateFolderTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for CreateFolderTool {
    fn name(&self) -> &str {
        "create-folder"
    }

    fn description(&self) -> &str {
        "Create a folder in the sandbox, including parent directories. \
         Optionally pass an octal mode string (e.g. '755')."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "path": {
                    "type": "string",
                    "description": "Folder path to create"
                },
                "mode": {
                    "type": "string",
                    "description": "Octal permission mode (e.g. '755')"
                }
            },
            "required": ["sandboxId", "path"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: CreateFolderArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .create_folder(&handle.id, &args.path, args.mode.as_deref())
            .await?;
        Ok(ToolResult::text(format!("Folder created: {}", args.path)))
    }
}

// ── delete-file ───────────────────────────────────────────────────────────────

pub struct DeleteFileTool {
    resolver: Arc<SandboxResolver>,
}

impl DeleteFileTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete-file"
    }

    fn description(&self) -> &str {
        "Delete a file or folder from the sandbox."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        sandbox_path_schema("File or folder path to delete")
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SandboxPathArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .delete_file(&handle.id, &args.path)
            .await?;
        Ok(ToolResult::text(format!("Deleted: {}", args.path)))
    }
}

// ── move-files ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MoveFilesArgs {
    sandbox_id: String,
    source: String,
    destination: String,
}

pub struct MoveFilesTool {
    resolver: Arc<SandboxResolver>,
}

impl MoveFilesTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for MoveFilesTool {
    fn name(&self) -> &str {
        "move-files"
    }

    fn description(&self) -> &str {
        "Move or rename a file or folder inside the sandbox."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "source": {
                    "type": "string",
                    "description": "Source path"
                },
                "destination": {
                    "type": "string",
                    "description": "Destination path"
                }
            },
            "required": ["sandboxId", "source", "destination"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: MoveFilesArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .move_files(&handle.id, &args.source, &args.destination)
            .await?;
        Ok(ToolResult::text(format!(
            "Moved {} -> {}",
            args.source, args.destination
        )))
    }
}

// ── find-files ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FindFilesArgs {
    sandbox_id: String,
    path: String,
    pattern: String,
}

pub struct FindFilesTool {
    resolver: Arc<SandboxResolver>,
}

impl FindFilesTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for FindFilesTool {
    fn name(&self) -> &str {
        "find-files"
    }

    fn description(&self) -> &str {
        "Search file contents under a path for a pattern, grep-style. \
         Returns matches with file, line number, and matching content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search under"
                },
                "pattern": {
                    "type": "string",
                    "description": "Pattern to search for"
                }
            },
            "required": ["sandboxId", "path", "pattern"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: FindFilesArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let matches = self
            .resolver
            .backend()
            .find_files(&handle.id, &args.path, &args.pattern)
            .await?;

        if matches.is_empty() {
            return Ok(ToolResult::text(format!(
                "No matches for '{}' under {}",
                args.pattern, args.path
            )));
        }
        let lines: Vec<String> = matches
            .iter()
            .map(|m| format!("{}:{}: {}", m.file, m.line, m.content))
            .collect();
        Ok(ToolResult::text(lines.join("\n")))
    }
}

// ── replace-in-files ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ReplaceInFilesArgs {
    sandbox_id: String,
    files: Vec<String>,
    pattern: String,
    new_value: String,
}

pub struct ReplaceInFilesTool {
    resolver: Arc<SandboxResolver>,
}

impl ReplaceInFilesTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ReplaceInFilesTool {
    fn name(&self) -> &str {
        "replace-in-files"
    }

    fn description(&self) -> &str {
        "Replace every occurrence of a pattern with a new value across the \
         given files. Returns the per-file outcome."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "files": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "File paths to rewrite"
                },
                "pattern": {
                    "type": "string",
                    "description": "Pattern to replace"
                },
                "newValue": {
                    "type": "string",
                    "description": "Replacement text"
                }
            },
            "required": ["sandboxId", "files", "pattern", "newValue"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: ReplaceInFilesArgs = parse_args(args)?;
        if args.files.is_empty() {
            return Err(Error::InvalidInput("files cannot be empty".to_string()));
        }
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let results = self
            .resolver
            .backend()
            .replace_in_files(&handle.id, &args.files, &args.pattern, &args.new_value)
            .await?;
        ToolResult::json(&results)
    }
}

// ── set-file-permissions ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SetFilePermissionsArgs {
    sandbox_id: String,
    path: String,
    mode: Option<String>,
    owner: Option<String>,
    group: Option<String>,
}

pub struct SetFilePermissionsTool {
    resolver: Arc<SandboxResolver>,
}

impl SetFilePermissionsTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for SetFilePermissionsTool {
    fn name(&self) -> &str {
        "set-file-permissions"
    }

    fn description(&self) -> &str {
        "Set permissions and/or ownership of a file in the sandbox. \
         At least one of mode, owner, or group must be given."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "path": {
                    "type": "string",
                    "description": "File path to modify"
                },
                "mode": {
                    "type": "string",
                    "description": "Octal permission mode (e.g. '644')"
                },
                "owner": {
                    "type": "string",
                    "description": "New owning user"
                },
                "group": {
                    "type": "string",
                    "description": "New owning group"
                }
            },
            "required": ["sandboxId", "path"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SetFilePermissionsArgs = parse_args(args)?;
        if args.mode.is_none() && args.owner.is_none() && args.group.is_none() {
            return Err(Error::InvalidInput(
                "at least one of mode, owner, or group is required".to_string(),
            ));
        }
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .set_file_permissions(
                &handle.id,
                &args.path,
                args.mode.as_deref(),
                args.owner.as_deref(),
                args.group.as_deref(),
            )
            .await?;
        Ok(ToolResult::text(format!("Permissions updated: {}", args.path)))
    }
}

// ── upload-file ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UploadFileArgs {
    sandbox_id: String,
    path: String,
    /// Base64-encoded file content.
    content: String,
}

pub struct UploadFileTool {
    resolver: Arc<SandboxResolver>,
}

impl UploadFileTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for UploadFileTool {
    fn name(&self) -> &str {
        "upload-file"
    }

    fn description(&self) -> &str {
        "Upload a file to the sandbox. Content is base64-encoded so binary \
         files survive the JSON transport. Parent directories are created."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "path": {
                    "type": "string",
                    "description": "Destination path in the sandbox"
                },
                "content": {
                    "type": "string",
                    "description": "Base64-encoded file content"
                }
            },
            "required": ["sandboxId", "path", "content"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: UploadFileArgs = parse_args(args)?;
        let content = base64::engine::general_purpose::STANDARD
            .decode(&args.content)
            .map_err(|e| Error::InvalidInput(format!("content is not valid base64: {e}")))?;

        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .upload_file(&handle.id, &args.path, &content)
            .await?;
        Ok(ToolResult::text(format!(
            "Uploaded {} ({} bytes)",
            args.path,
            content.len()
        )))
    }
}

// ── download-file ─────────────────────────────────────────────────────────────

pub struct DownloadFileTool {
    resolver: Arc<SandboxResolver>,
}

impl DownloadFileTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for DownloadFileTool {
    fn name(&self) -> &str {
        "download-file"
    }

    fn description(&self) -> &str {
        "Download a file from the sandbox. Returns the content base64-encoded."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        sandbox_path_schema("File path to download")
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: SandboxPathArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let content = self
            .resolver
            .backend()
            .download_file(&handle.id, &args.path)
            .await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&content);
        ToolResult::json(&json!({
            "path": args.path,
            "size": content.len(),
            "content": encoded,
        }))
    }
}
