//! Git tools: clone, status, branches, add, commit, pull, push.
//!
//! All operations run against a repository path inside the sandbox. Clone,
//! pull, and push accept optional credentials forwarded to the backend;
//! nothing is stored server-side.

use crate::backend::{GitAuth, GitCloneRequest, GitCommitRequest};
use crate::error::Error;
use crate::resolver::SandboxResolver;
use crate::tools::traits::{parse_args, Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RepoPathArgs {
    sandbox_id: String,
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RepoAuthArgs {
    sandbox_id: String,
    path: String,
    username: Option<String>,
    password: Option<String>,
}

impl RepoAuthArgs {
    fn auth(&self) -> Result<Option<GitAuth>, Error> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Some(GitAuth {
                username: username.clone(),
                password: password.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(Error::InvalidInput(
                "username and password must be provided together".to_string(),
            )),
        }
    }
}

fn repo_path_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "sandboxId": {
                "type": "string",
                "description": "Identifier of the target sandbox"
            },
            "path": {
                "type": "string",
                "description": "Repository path inside the sandbox"
            }
        },
        "required": ["sandboxId", "path"]
    })
}

fn repo_auth_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "sandboxId": {
                "type": "string",
                "description": "Identifier of the target sandbox"
            },
            "path": {
                "type": "string",
                "description": "Repository path inside the sandbox"
            },
            "username": {
                "type": "string",
                "description": "Username for the remote, if it requires auth"
            },
            "password": {
                "type": "string",
                "description": "Password or token for the remote"
            }
        },
        "required": ["sandboxId", "path"]
    })
}

// ── git-clone ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct GitCloneArgs {
    sandbox_id: String,
    url: String,
    path: String,
    branch: Option<String>,
    commit_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

pub struct GitCloneTool {
    resolver: Arc<SandboxResolver>,
}

impl GitCloneTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GitCloneTool {
    fn name(&self) -> &str {
        "git-clone"
    }

    fn description(&self) -> &str {
        "Clone a git repository into the sandbox. Optionally check out a \
         specific branch or commit, and pass credentials for private remotes."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandboxId": {
                    "type": "string",
                    "description": "Identifier of the target sandbox"
                },
                "url": {
                    "type": "string",
                    "description": "Repository URL to clone"
                },
                "path": {
                    "type": "string",
                    "description": "Destination path inside the sandbox"
                },
                "branch": {
                    "type": "string",
                    "description": "Branch to check out"
                },
                "commitId": {
                    "type": "string",
                    "description": "Commit to check out (overrides branch)"
                },
                "username": {
                    "type": "string",
                    "description": "Username for the remote, if it requires auth"
                },
                "password": {
                    "type": "string",
                    "description": "Password or token for the remote"
                }
            },
            "required": ["sandboxId", "url", "path"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: GitCloneArgs = parse_args(args)?;
        let auth = match (&args.username, &args.password) {
            (Some(username), Some(password)) => Some(GitAuth {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(Error::InvalidInput(
                    "username and password must be provided together".to_string(),
                ))
            }
        };

        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let request = GitCloneRequest {
            url: args.url.clone(),
            path: args.path.clone(),
            branch: args.branch,
            commit_id: args.commit_id,
            auth,
        };
        self.resolver.backend().git_clone(&handle.id, &request).await?;
        Ok(ToolResult::text(format!(
            "Cloned {} into {}",
            args.url, args.path
        )))
    }
}

// ── git-status ────────────────────────────────────────────────────────────────

pub struct GitStatusTool {
    resolver: Arc<SandboxResolver>,
}

impl GitStatusTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &str {
        "git-status"
    }

    fn description(&self) -> &str {
        "Get the status of a git repository in the sandbox: current branch, \
         ahead/behind counts, and per-file status. Returns JSON."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_path_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: RepoPathArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let status = self
            .resolver
            .backend()
            .git_status(&handle.id, &args.path)
            .await?;
        ToolResult::json(&status)
    }
}

// ── git-branches ──────────────────────────────────────────────────────────────

pub struct GitBranchesTool {
    resolver: Arc<SandboxResolver>,
}

impl GitBranchesTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GitBranchesTool {
    fn name(&self) -> &str {
        "git-branches"
    }

    fn description(&self) -> &str {
        "List branches of a git repository in the sandbox."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_path_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: RepoPathArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let branches = self
            .resolver
            .backend()
            .git_branches(&handle.id, &args.path)
            .await?;
        ToolResult::json(&json!({ "branches": branches }))
    }
}

// ── git-add ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct GitAddArgs {
    sandbox_id: String,
    path: String,
    files: Vec<String>,
}

pub struct GitAddTool {
    resolver: Arc<SandboxResolver>,
}

impl GitAddTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GitAddTool {
    fn name(&self) -> &str {
        "git-add"
    }

    fn description(&self) -> &str {
        "Stage files in a git repository in the sandbox. \
         Pass ['.'] to stage everything."
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
                    "description": "Repository path inside the sandbox"
                },
                "files": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Paths to stage, relative to the repository root"
                }
            },
            "required": ["sandboxId", "path", "files"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: GitAddArgs = parse_args(args)?;
        if args.files.is_empty() {
            return Err(Error::InvalidInput("files cannot be empty".to_string()));
        }
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .git_add(&handle.id, &args.path, &args.files)
            .await?;
        Ok(ToolResult::text(format!(
            "Staged {} path(s) in {}",
            args.files.len(),
            args.path
        )))
    }
}

// ── git-commit ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct GitCommitArgs {
    sandbox_id: String,
    path: String,
    message: String,
    author: String,
    email: String,
}

pub struct GitCommitTool {
    resolver: Arc<SandboxResolver>,
}

impl GitCommitTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git-commit"
    }

    fn description(&self) -> &str {
        "Commit staged changes in a git repository in the sandbox. \
         Returns the new commit SHA."
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
                    "description": "Repository path inside the sandbox"
                },
                "message": {
                    "type": "string",
                    "description": "Commit message"
                },
                "author": {
                    "type": "string",
                    "description": "Author name"
                },
                "email": {
                    "type": "string",
                    "description": "Author email"
                }
            },
            "required": ["sandboxId", "path", "message", "author", "email"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: GitCommitArgs = parse_args(args)?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        let request = GitCommitRequest {
            path: args.path,
            message: args.message,
            author: args.author,
            email: args.email,
        };
        let response = self
            .resolver
            .backend()
            .git_commit(&handle.id, &request)
            .await?;
        Ok(ToolResult::text(format!("Committed: {}", response.sha)))
    }
}

// ── git-pull ──────────────────────────────────────────────────────────────────

pub struct GitPullTool {
    resolver: Arc<SandboxResolver>,
}

impl GitPullTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GitPullTool {
    fn name(&self) -> &str {
        "git-pull"
    }

    fn description(&self) -> &str {
        "Pull changes from the remote into a repository in the sandbox."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_auth_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: RepoAuthArgs = parse_args(args)?;
        let auth = args.auth()?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .git_pull(&handle.id, &args.path, auth.as_ref())
            .await?;
        Ok(ToolResult::text(format!("Pulled into {}", args.path)))
    }
}

// ── git-push ──────────────────────────────────────────────────────────────────

pub struct GitPushTool {
    resolver: Arc<SandboxResolver>,
}

impl GitPushTool {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GitPushTool {
    fn name(&self) -> &str {
        "git-push"
    }

    fn description(&self) -> &str {
        "Push committed changes from a repository in the sandbox to its remote."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_auth_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error> {
        let args: RepoAuthArgs = parse_args(args)?;
        let auth = args.auth()?;
        let handle = self.resolver.resolve(&args.sandbox_id).await?;
        self.resolver
            .backend()
            .git_push(&handle.id, &args.path, auth.as_ref())
            .await?;
        Ok(ToolResult::text(format!("Pushed from {}", args.path)))
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
        assert_eq!(GitCloneTool::new(r.clone()).name(), "git-clone");
        assert_eq!(GitStatusTool::new(r.clone()).name(), "git-status");
        assert_eq!(GitBranchesTool::new(r.clone()).name(), "git-branches");
        assert_eq!(GitAddTool::new(r.clone()).name(), "git-add");
        assert_eq!(GitCommitTool::new(r.clone()).name(), "git-commit");
        assert_eq!(GitPullTool::new(r.clone()).name(), "git-pull");
        assert_eq!(GitPushTool::new(r).name(), "git-push");
    }

    #[tokio::test]
    async fn status_returns_branch_json() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = GitStatusTool::new(resolver(backend));
        let result = tool
            .execute(json!({"sandboxId": "sb1", "path": "/repo"}))
            .await
            .unwrap();
        assert!(result.output.contains("\"currentBranch\": \"main\""));
    }

    #[tokio::test]
    async fn clone_rejects_half_credentials() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = GitCloneTool::new(resolver(backend));
        let err = tool
            .execute(json!({
                "sandboxId": "sb1",
                "url": "https://example.com/repo.git",
                "path": "/repo",
                "username": "alice"
            }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn commit_returns_sha() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = GitCommitTool::new(resolver(backend));
        let result = tool
            .execute(json!({
                "sandboxId": "sb1",
                "path": "/repo",
                "message": "fix",
                "author": "alice",
                "email": "alice@example.com"
            }))
            .await
            .unwrap();
        assert!(result.output.contains("deadbeef"));
    }

    #[tokio::test]
    async fn add_requires_files() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let tool = GitAddTool::new(resolver(backend));
        let err = tool
            .execute(json!({"sandboxId": "sb1", "path": "/repo", "files": []}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
