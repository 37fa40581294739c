//! Sandbox backend abstraction.
//!
//! Defines the [`SandboxBackend`] trait that the resolver and every tool call
//! through, plus the wire types the backend returns. One production
//! implementation exists:
//!
//! - [`http::HttpSandboxBackend`] — REST client for the remote sandbox API
//!
//! The trait boundary keeps all HTTP details in one module and lets tests
//! substitute an in-memory double.

pub mod http;

use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The resolved, backend-returned representation of a sandbox, as opposed to
/// its bare identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxHandle {
    pub id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for sandbox creation. Identifiers are assigned by the
/// backend, never by this server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSandboxConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_stop_interval: Option<u32>,
    /// Forwarded to the backend, not enforced locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Output from a command or code run executed inside a sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: i64,
}

/// A long-lived exec session inside a sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(alias = "sessionId")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<SessionCommand>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCommand {
    pub id: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
}

/// Result of running a command inside a session. `exit_code` is absent while
/// an async command is still running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCommandOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
}

/// A single directory entry from a sandbox filesystem listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<String>,
}

/// A grep-style match from a file search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub file: String,
    pub line: u64,
    pub content: String,
}

/// Per-file outcome of a text replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResult {
    pub file: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub current_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ahead: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behind: Option<i64>,
    #[serde(default)]
    pub file_status: Vec<GitFileStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitFileStatus {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCloneRequest {
    pub url: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<GitAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitRequest {
    pub path: String,
    pub message: String,
    pub author: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitResponse {
    pub sha: String,
}

/// Remote sandbox API, one method per backend operation.
///
/// All methods are async network round-trips and may fail with
/// [`Error::NotFound`] (the referenced sandbox/session/path does not exist)
/// or [`Error::Backend`] (anything else). Error subtypes beyond that are not
/// interpreted here; callers get them as-is.
#[async_trait]
pub trait SandboxBackend: Send + Sync {
    // Lifecycle
    async fn create(&self, config: &CreateSandboxConfig) -> Result<SandboxHandle, Error>;
    async fn get(&self, id: &str) -> Result<SandboxHandle, Error>;
    async fn list(&self) -> Result<Vec<SandboxHandle>, Error>;
    async fn start(&self, id: &str, timeout_ms: Option<u64>) -> Result<SandboxHandle, Error>;
    async fn stop(&self, id: &str) -> Result<(), Error>;
    async fn remove(&self, id: &str, timeout_ms: Option<u64>) -> Result<(), Error>;

    // Process execution
    async fn execute_command(
        &self,
        id: &str,
        command: &str,
        cwd: Option<&str>,
        timeout_ms: Option<u64>,
    ) -> Result<CommandOutput, Error>;
    async fn code_run(
        &self,
        id: &str,
        code: &str,
        argv: Option<&[String]>,
    ) -> Result<CommandOutput, Error>;
    async fn create_session(&self, id: &str, session_id: &str) -> Result<(), Error>;
    async fn execute_session_command(
        &self,
        id: &str,
        session_id: &str,
        command: &str,
        run_async: bool,
    ) -> Result<SessionCommandOutput, Error>;
    async fn delete_session(&self, id: &str, session_id: &str) -> Result<(), Error>;
    async fn list_sessions(&self, id: &str) -> Result<Vec<SessionInfo>, Error>;

    // Filesystem
    async fn list_files(&self, id: &str, path: &str) -> Result<Vec<FileEntry>, Error>;
    async fn create_folder(&self, id: &str, path: &str, mode: Option<&str>) -> Result<(), Error>;
    async fn delete_file(&self, id: &str, path: &str) -> Result<(), Error>;
    async fn move_files(&self, id: &str, source: &str, destination: &str) -> Result<(), Error>;
    async fn find_files(&self, id: &str, path: &str, pattern: &str)
        -> Result<Vec<SearchMatch>, Error>;
    async fn replace_in_files(
        &self,
        id: &str,
        files: &[String],
        pattern: &str,
        new_value: &str,
    ) -> Result<Vec<ReplaceResult>, Error>;
    async fn set_file_permissions(
        &self,
        id: &str,
        path: &str,
        mode: Option<&str>,
        owner: Option<&str>,
        group: Option<&str>,
    ) -> Result<(), Error>;
    async fn upload_file(&self, id: &str, path: &str, content: &[u8]) -> Result<(), Error>;
    async fn download_file(&self, id: &str, path: &str) -> Result<Vec<u8>, Error>;

    // Git
    async fn git_clone(&self, id: &str, request: &GitCloneRequest) -> Result<(), Error>;
    async fn git_status(&self, id: &str, path: &str) -> Result<GitStatus, Error>;
    async fn git_branches(&self, id: &str, path: &str) -> Result<Vec<String>, Error>;
    async fn git_add(&self, id: &str, path: &str, files: &[String]) -> Result<(), Error>;
    async fn git_commit(&self, id: &str, request: &GitCommitRequest)
        -> Result<GitCommitResponse, Error>;
    async fn git_pull(&self, id: &str, path: &str, auth: Option<&GitAuth>) -> Result<(), Error>;
    async fn git_push(&self, id: &str, path: &str, auth: Option<&GitAuth>) -> Result<(), Error>;
}
