//! Tool surface of the server.
//!
//! Every operation is a [`traits::Tool`] registered in a [`registry::ToolRegistry`]
//! at startup. Tools are thin delegators: typed argument parsing, one resolve,
//! one backend call. All sandbox API details live in [`crate::backend`].

pub mod files;
pub mod git;
pub mod process;
pub mod registry;
pub mod sandbox;
pub mod session;
pub mod traits;

pub use registry::ToolRegistry;
pub use traits::{Tool, ToolResult};

use crate::resolver::SandboxResolver;
use std::sync::Arc;

/// Build the full tool registry. Fails if any two tools share a name,
/// which is a wiring bug and fatal at startup.
pub fn build_registry(resolver: Arc<SandboxResolver>) -> anyhow::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    // Lifecycle
    registry.register(Arc::new(sandbox::CreateSandboxTool::new(resolver.clone())))?;
    registry.register(Arc::new(sandbox::GetSandboxTool::new(resolver.clone())))?;
    registry.register(Arc::new(sandbox::ListSandboxesTool::new(resolver.clone())))?;
    registry.register(Arc::new(sandbox::StartSandboxTool::new(resolver.clone())))?;
    registry.register(Arc::new(sandbox::StopSandboxTool::new(resolver.clone())))?;
    registry.register(Arc::new(sandbox::RemoveSandboxTool::new(resolver.clone())))?;

    // Process execution
    registry.register(Arc::new(process::ExecuteCommandTool::new(resolver.clone())))?;
    registry.register(Arc::new(process::CodeRunTool::new(resolver.clone())))?;
    registry.register(Arc::new(session::CreateSessionTool::new(resolver.clone())))?;
    registry.register(Arc::new(session::ExecuteSessionCommandTool::new(resolver.clone())))?;
    registry.register(Arc::new(session::DeleteSessionTool::new(resolver.clone())))?;
    registry.register(Arc::new(session::ListSessionsTool::new(resolver.clone())))?;

    // Filesystem
    registry.register(Arc::new(files::ListFilesTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::CreateFolderTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::DeleteFileTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::MoveFilesTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::FindFilesTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::ReplaceInFilesTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::SetFilePermissionsTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::UploadFileTool::new(resolver.clone())))?;
    registry.register(Arc::new(files::DownloadFileTool::new(resolver.clone())))?;

    // Git
    registry.register(Arc::new(git::GitCloneTool::new(resolver.clone())))?;
    registry.register(Arc::new(git::GitStatusTool::new(resolver.clone())))?;
    registry.register(Arc::new(git::GitBranchesTool::new(resolver.clone())))?;
    registry.register(Arc::new(git::GitAddTool::new(resolver.clone())))?;
    registry.register(Arc::new(git::GitCommitTool::new(resolver.clone())))?;
    registry.register(Arc::new(git::GitPullTool::new(resolver.clone())))?;
    registry.register(Arc::new(git::GitPushTool::new(resolver)))?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::StubBackend;
    use serde_json::json;
    use std::time::Duration;

    fn registry_with(backend: Arc<StubBackend>) -> ToolRegistry {
        let resolver = Arc::new(SandboxResolver::new(backend, Duration::from_secs(30)));
        build_registry(resolver).unwrap()
    }

    #[test]
    fn registry_holds_all_tools_without_name_clashes() {
        let registry = registry_with(Arc::new(StubBackend::default()));
        assert_eq!(registry.len(), 28);
    }

    #[tokio::test]
    async fn invalid_create_args_fail_before_any_backend_call() {
        let backend = Arc::new(StubBackend::default());
        let registry = registry_with(backend.clone());

        let err = registry
            .invoke("create-sandbox", json!({"badField": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(backend.handles.lock().is_empty());
        assert_eq!(backend.get_call_count(), 0);
    }

    #[tokio::test]
    async fn get_missing_sandbox_yields_not_found_kind() {
        let registry = registry_with(Arc::new(StubBackend::default()));
        let err = registry
            .invoke("get-sandbox", json!({"sandboxId": "missing"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.to_payload()["kind"], "not_found");
    }

    #[tokio::test]
    async fn unknown_operation_is_reported_as_such() {
        let registry = registry_with(Arc::new(StubBackend::default()));
        let err = registry.invoke("no-such-tool", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "unknown_operation");
    }

    #[tokio::test]
    async fn sandbox_scoped_tools_share_the_resolver_cache() {
        let backend = Arc::new(StubBackend::with_sandbox("sb1"));
        let registry = registry_with(backend.clone());

        registry
            .invoke("get-sandbox", json!({"sandboxId": "sb1"}))
            .await
            .unwrap();
        registry
            .invoke("execute-command", json!({"sandboxId": "sb1", "command": "ls"}))
            .await
            .unwrap();
        // Second tool hit the fresh cache entry instead of re-fetching.
        assert_eq!(backend.get_call_count(), 1);
    }
}
