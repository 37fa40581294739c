//! Read-only resource views over the sandbox backend.
//!
//! Resources are addressed by `sandbox://` URIs and return JSON documents.
//! They reuse the same resolver as the tools, so a freshly resolved handle
//! is shared between a tool call and a resource read of the same sandbox.
//!
//! Supported URIs:
//!   sandbox://sandboxes
//!   sandbox://sandboxes/{id}
//!   sandbox://sandboxes/{id}/files?path={path}
//!   sandbox://sandboxes/{id}/sessions
//!   sandbox://sandboxes/{id}/git/status?path={path}

use crate::error::Error;
use crate::resolver::SandboxResolver;
use serde_json::json;
use std::sync::Arc;

const URI_SCHEME: &str = "sandbox://";

pub struct ResourceRegistry {
    resolver: Arc<SandboxResolver>,
}

impl ResourceRegistry {
    pub fn new(resolver: Arc<SandboxResolver>) -> Self {
        Self { resolver }
    }

    /// Resource descriptors for `resources/list`. Parameterized views are
    /// advertised as URI templates.
    pub fn describe(&self) -> Vec<serde_json::Value> {
        vec![
            json!({
                "uri": "sandbox://sandboxes",
                "name": "Sandboxes",
                "description": "All sandboxes visible to the configured credentials",
                "mimeType": "application/json",
            }),
            json!({
                "uriTemplate": "sandbox://sandboxes/{id}",
                "name": "Sandbox",
                "description": "Details of a single sandbox",
                "mimeType": "application/json",
            }),
            json!({
                "uriTemplate": "sandbox://sandboxes/{id}/files?path={path}",
                "name": "Sandbox files",
                "description": "Directory listing at a path inside a sandbox",
                "mimeType": "application/json",
            }),
            json!({
                "uriTemplate": "sandbox://sandboxes/{id}/sessions",
                "name": "Sandbox sessions",
                "description": "Exec sessions in a sandbox with their command history",
                "mimeType": "application/json",
            }),
            json!({
                "uriTemplate": "sandbox://sandboxes/{id}/git/status?path={path}",
                "name": "Git status",
                "description": "Git status of a repository inside a sandbox",
                "mimeType": "application/json",
            }),
        ]
    }

    /// Read a resource by URI, returning a pretty-printed JSON document.
    pub async fn read(&self, uri: &str) -> Result<String, Error> {
        let rest = uri
            .strip_prefix(URI_SCHEME)
            .ok_or_else(|| Error::InvalidInput(format!("unsupported resource URI: {uri}")))?;

        let (path_part, query) = match rest.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (rest, None),
        };
        let segments: Vec<&str> = path_part.trim_end_matches('/').split('/').collect();

        match segments.as_slice() {
            ["sandboxes"] => {
                let handles = self.resolver.backend().list().await?;
                to_pretty(&json!({ "sandboxes": handles, "total": handles.len() }))
            }
            ["sandboxes", id] => {
                let handle = self.resolver.resolve(id).await?;
                to_pretty(&handle)
            }
            ["sandboxes", id, "files"] => {
                let path = require_path_param(uri, query)?;
                let handle = self.resolver.resolve(id).await?;
                let entries = self.resolver.backend().list_files(&handle.id, &path).await?;
                to_pretty(&json!({ "path": path, "entries": entries }))
            }
            ["sandboxes", id, "sessions"] => {
                let handle = self.resolver.resolve(id).await?;
                let sessions = self.resolver.backend().list_sessions(&handle.id).await?;
                to_pretty(&json!({ "sessions": sessions, "total": sessions.len() }))
            }
            ["sandboxes", id, "git", "status"] => {
                let path = require_path_param(uri, query)?;
                let handle = self.resolver.resolve(id).await?;
                let status = self.resolver.backend().git_status(&handle.id, &path).await?;
                to_pretty(&status)
            }
            _ => Err(Error::InvalidInput(format!(
                "unsupported resource URI: {uri}"
            ))),
        }
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::Backend(format!("failed to serialize resource: {e}")))
}

fn require_path_param(uri: &str, query: Option<&str>) -> Result<String, Error> {
    let query = query
        .ok_or_else(|| Error::InvalidInput(format!("resource URI requires ?path=: {uri}")))?;
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("path=") {
            let decoded = urlencoding::decode(value)
                .map_err(|e| Error::InvalidInput(format!("invalid path encoding: {e}")))?;
            return Ok(decoded.into_owned());
        }
    }
    Err(Error::InvalidInput(format!(
        "resource URI requires ?path=: {uri}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::StubBackend;
    use std::time::Duration;

    fn registry(backend: Arc<StubBackend>) -> ResourceRegistry {
        let resolver = Arc::new(SandboxResolver::new(backend, Duration::from_secs(30)));
        ResourceRegistry::new(resolver)
    }

    #[test]
    fn describe_lists_all_views() {
        let registry = registry(Arc::new(StubBackend::default()));
        assert_eq!(registry.describe().len(), 5);
    }

    #[tokio::test]
    async fn read_sandboxes_list() {
        let registry = registry(Arc::new(StubBackend::with_sandbox("sb1")));
        let doc = registry.read("sandbox://sandboxes").await.unwrap();
        assert!(doc.contains("\"total\": 1"));
    }

    #[tokio::test]
    async fn read_single_sandbox() {
        let registry = registry(Arc::new(StubBackend::with_sandbox("sb1")));
        let doc = registry.read("sandbox://sandboxes/sb1").await.unwrap();
        assert!(doc.contains("\"sb1\""));
    }

    #[tokio::test]
    async fn read_files_requires_path_param() {
        let registry = registry(Arc::new(StubBackend::with_sandbox("sb1")));
        let err = registry
            .read("sandbox://sandboxes/sb1/files")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn read_files_decodes_path() {
        let registry = registry(Arc::new(StubBackend::with_sandbox("sb1")));
        let doc = registry
            .read("sandbox://sandboxes/sb1/files?path=%2Fwork%20dir")
            .await
            .unwrap();
        assert!(doc.contains("/work dir"));
    }

    #[tokio::test]
    async fn read_git_status() {
        let registry = registry(Arc::new(StubBackend::with_sandbox("sb1")));
        let doc = registry
            .read("sandbox://sandboxes/sb1/git/status?path=%2Frepo")
            .await
            .unwrap();
        assert!(doc.contains("\"currentBranch\": \"main\""));
    }

    #[tokio::test]
    async fn unknown_uri_shape_is_invalid_input() {
        let registry = registry(Arc::new(StubBackend::default()));
        let err = registry.read("sandbox://other/thing").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");

        let err = registry.read("file:///etc/passwd").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn missing_sandbox_propagates_not_found() {
        let registry = registry(Arc::new(StubBackend::default()));
        let err = registry.read("sandbox://sandboxes/missing").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
