//! HTTP sandbox backend — REST client for the remote sandbox API.
//!
//! All HTTP details live here; the rest of the server only sees the
//! [`SandboxBackend`] trait. Every request carries the bearer API key and,
//! when configured, the region target header. A 404 from the backend maps to
//! [`Error::NotFound`]; any other non-success status or transport failure
//! maps to [`Error::Backend`] with the response body attached.

use super::{
    CommandOutput, CreateSandboxConfig, FileEntry, GitAuth, GitCloneRequest, GitCommitRequest,
    GitCommitResponse, GitStatus, ReplaceResult, SandboxBackend, SandboxHandle, SearchMatch,
    SessionCommandOutput, SessionInfo,
};
use crate::config::Config;
use crate::error::Error;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Header carrying the backend region/target, when one is configured.
const TARGET_HEADER: &str = "X-Sandbox-Target";

pub struct HttpSandboxBackend {
    base_url: String,
    api_key: String,
    target: Option<String>,
    http: reqwest::Client,
}

impl HttpSandboxBackend {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            target: config.target.clone(),
            http,
        })
    }

    #[cfg(test)]
    fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: "test-key".to_string(),
            target: None,
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        if let Some(target) = &self.target {
            builder = builder.header(TARGET_HEADER, target);
        }
        builder
    }

    /// Send a request and map the response status into the error taxonomy.
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = builder
            .send()
            .await
            .map_err(|e| Error::Backend(format!("backend request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::NotFound(not_found_message(&body)));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(Error::Backend(format!("backend returned {status}: {body}")));
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, Error> {
        let resp = self.send(builder).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Backend(format!("failed to read backend response: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Backend(format!("failed to parse backend response: {e}\nBody: {body}")))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), Error> {
        self.send(builder).await.map(|_| ())
    }

    fn files_url(id: &str, path: &str) -> String {
        format!(
            "/sandboxes/{id}/files?path={encoded}",
            encoded = urlencoding::encode(path)
        )
    }
}

/// Backends differ in how much prose they wrap around a 404; keep the body
/// when it says something, otherwise fall back to a generic message.
fn not_found_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = parsed["message"].as_str() {
            return message.to_string();
        }
    }
    if body.trim().is_empty() {
        "resource not found".to_string()
    } else {
        body.trim().to_string()
    }
}

#[async_trait]
impl SandboxBackend for HttpSandboxBackend {
    async fn create(&self, config: &CreateSandboxConfig) -> Result<SandboxHandle, Error> {
        self.send_json(self.request(Method::POST, "/sandboxes").json(config))
            .await
    }

    async fn get(&self, id: &str) -> Result<SandboxHandle, Error> {
        self.send_json(self.request(Method::GET, &format!("/sandboxes/{id}")))
            .await
    }

    async fn list(&self) -> Result<Vec<SandboxHandle>, Error> {
        self.send_json(self.request(Method::GET, "/sandboxes")).await
    }

    async fn start(&self, id: &str, timeout_ms: Option<u64>) -> Result<SandboxHandle, Error> {
        let mut path = format!("/sandboxes/{id}/start");
        if let Some(timeout) = timeout_ms {
            path.push_str(&format!("?timeout={}", timeout / 1000));
        }
        self.send_json(self.request(Method::POST, &path)).await
    }

    async fn stop(&self, id: &str) -> Result<(), Error> {
        self.send_empty(self.request(Method::POST, &format!("/sandboxes/{id}/stop")))
            .await
    }

    async fn remove(&self, id: &str, timeout_ms: Option<u64>) -> Result<(), Error> {
        let mut path = format!("/sandboxes/{id}");
        if let Some(timeout) = timeout_ms {
            path.push_str(&format!("?timeout={}", timeout / 1000));
        }
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn execute_command(
        &self,
        id: &str,
        command: &str,
        cwd: Option<&str>,
        timeout_ms: Option<u64>,
    ) -> Result<CommandOutput, Error> {
        let body = json!({
            "command": command,
            "cwd": cwd,
            "timeout": timeout_ms.map(|t| t / 1000),
        });
        self.send_json(
            self.request(Method::POST, &format!("/sandboxes/{id}/process/execute"))
                .json(&body),
        )
        .await
    }

    async fn code_run(
        &self,
        id: &str,
        code: &str,
        argv: Option<&[String]>,
    ) -> Result<CommandOutput, Error> {
        let body = json!({
            "code": code,
            "argv": argv,
        });
        self.send_json(
            self.request(Method::POST, &format!("/sandboxes/{id}/process/code-run"))
                .json(&body),
        )
        .await
    }

    async fn create_session(&self, id: &str, session_id: &str) -> Result<(), Error> {
        let body = json!({ "sessionId": session_id });
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/process/sessions"))
                .json(&body),
        )
        .await
    }

    async fn execute_session_command(
        &self,
        id: &str,
        session_id: &str,
        command: &str,
        run_async: bool,
    ) -> Result<SessionCommandOutput, Error> {
        let body = json!({
            "command": command,
            "runAsync": run_async,
        });
        self.send_json(
            self.request(
                Method::POST,
                &format!("/sandboxes/{id}/process/sessions/{session_id}/exec"),
            )
            .json(&body),
        )
        .await
    }

    async fn delete_session(&self, id: &str, session_id: &str) -> Result<(), Error> {
        self.send_empty(self.request(
            Method::DELETE,
            &format!("/sandboxes/{id}/process/sessions/{session_id}"),
        ))
        .await
    }

    async fn list_sessions(&self, id: &str) -> Result<Vec<SessionInfo>, Error> {
        self.send_json(self.request(Method::GET, &format!("/sandboxes/{id}/process/sessions")))
            .await
    }

    async fn list_files(&self, id: &str, path: &str) -> Result<Vec<FileEntry>, Error> {
        self.send_json(self.request(Method::GET, &Self::files_url(id, path)))
            .await
    }

    async fn create_folder(&self, id: &str, path: &str, mode: Option<&str>) -> Result<(), Error> {
        let body = json!({ "path": path, "mode": mode });
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/files/folder"))
                .json(&body),
        )
        .await
    }

    async fn delete_file(&self, id: &str, path: &str) -> Result<(), Error> {
        self.send_empty(self.request(Method::DELETE, &Self::files_url(id, path)))
            .await
    }

    async fn move_files(&self, id: &str, source: &str, destination: &str) -> Result<(), Error> {
        let body = json!({ "source": source, "destination": destination });
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/files/move"))
                .json(&body),
        )
        .await
    }

    async fn find_files(
        &self,
        id: &str,
        path: &str,
        pattern: &str,
    ) -> Result<Vec<SearchMatch>, Error> {
        let url = format!(
            "/sandboxes/{id}/files/search?path={path}&pattern={pattern}",
            path = urlencoding::encode(path),
            pattern = urlencoding::encode(pattern),
        );
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn replace_in_files(
        &self,
        id: &str,
        files: &[String],
        pattern: &str,
        new_value: &str,
    ) -> Result<Vec<ReplaceResult>, Error> {
        let body = json!({
            "files": files,
            "pattern": pattern,
            "newValue": new_value,
        });
        self.send_json(
            self.request(Method::POST, &format!("/sandboxes/{id}/files/replace"))
                .json(&body),
        )
        .await
    }

    async fn set_file_permissions(
        &self,
        id: &str,
        path: &str,
        mode: Option<&str>,
        owner: Option<&str>,
        group: Option<&str>,
    ) -> Result<(), Error> {
        let body = json!({
            "path": path,
            "mode": mode,
            "owner": owner,
            "group": group,
        });
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/files/permissions"))
                .json(&body),
        )
        .await
    }

    async fn upload_file(&self, id: &str, path: &str, content: &[u8]) -> Result<(), Error> {
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        let form = reqwest::multipart::Form::new()
            .text("path", path.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(content.to_vec())
                    .file_name(file_name)
                    .mime_str("application/octet-stream")
                    .map_err(|e| Error::Backend(format!("mime type error: {e}")))?,
            );

        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/files/upload"))
                .multipart(form),
        )
        .await
    }

    async fn download_file(&self, id: &str, path: &str) -> Result<Vec<u8>, Error> {
        let url = format!(
            "/sandboxes/{id}/files/download?path={encoded}",
            encoded = urlencoding::encode(path)
        );
        let resp = self.send(self.request(Method::GET, &url)).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Backend(format!("failed to read backend response: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn git_clone(&self, id: &str, request: &GitCloneRequest) -> Result<(), Error> {
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/git/clone"))
                .json(request),
        )
        .await
    }

    async fn git_status(&self, id: &str, path: &str) -> Result<GitStatus, Error> {
        let url = format!(
            "/sandboxes/{id}/git/status?path={encoded}",
            encoded = urlencoding::encode(path)
        );
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn git_branches(&self, id: &str, path: &str) -> Result<Vec<String>, Error> {
        let url = format!(
            "/sandboxes/{id}/git/branches?path={encoded}",
            encoded = urlencoding::encode(path)
        );
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn git_add(&self, id: &str, path: &str, files: &[String]) -> Result<(), Error> {
        let body = json!({ "path": path, "files": files });
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/git/add"))
                .json(&body),
        )
        .await
    }

    async fn git_commit(
        &self,
        id: &str,
        request: &GitCommitRequest,
    ) -> Result<GitCommitResponse, Error> {
        self.send_json(
            self.request(Method::POST, &format!("/sandboxes/{id}/git/commit"))
                .json(request),
        )
        .await
    }

    async fn git_pull(&self, id: &str, path: &str, auth: Option<&GitAuth>) -> Result<(), Error> {
        let body = json!({ "path": path, "auth": auth });
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/git/pull"))
                .json(&body),
        )
        .await
    }

    async fn git_push(&self, id: &str, path: &str, auth: Option<&GitAuth>) -> Result<(), Error> {
        let body = json!({ "path": path, "auth": auth });
        self.send_empty(
            self.request(Method::POST, &format!("/sandboxes/{id}/git/push"))
                .json(&body),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_returns_handle_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sandboxes/sb1"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "sb1",
                "state": "started",
            })))
            .mount(&server)
            .await;

        let backend = HttpSandboxBackend::for_base_url(&server.uri());
        let handle = backend.get("sb1").await.unwrap();
        assert_eq!(handle.id, "sb1");
        assert_eq!(handle.state, "started");
    }

    #[tokio::test]
    async fn get_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sandboxes/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "sandbox missing not found"})),
            )
            .mount(&server)
            .await;

        let backend = HttpSandboxBackend::for_base_url(&server.uri());
        let err = backend.get("missing").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn server_errors_map_to_backend_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sandboxes"))
            .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let backend = HttpSandboxBackend::for_base_url(&server.uri());
        let err = backend.list().await.unwrap_err();
        assert_eq!(err.kind(), "backend_error");
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn execute_command_parses_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandboxes/sb1/process/execute"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stdout": "hi\n",
                "stderr": "",
                "exitCode": 0,
            })))
            .mount(&server)
            .await;

        let backend = HttpSandboxBackend::for_base_url(&server.uri());
        let output = backend
            .execute_command("sb1", "echo hi", Some("/workspace"), Some(5_000))
            .await
            .unwrap();
        assert_eq!(output.stdout, "hi\n");
        assert_eq!(output.exit_code, 0);
    }

    #[tokio::test]
    async fn list_files_encodes_path_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sandboxes/sb1/files"))
            .and(query_param("path", "/work dir"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "main.rs", "isDir": false, "size": 42},
            ])))
            .mount(&server)
            .await;

        let backend = HttpSandboxBackend::for_base_url(&server.uri());
        let entries = backend.list_files("sb1", "/work dir").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "main.rs");
        assert!(!entries[0].is_dir);
    }

    #[tokio::test]
    async fn git_status_parses_branch_and_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sandboxes/sb1/git/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "currentBranch": "main",
                "ahead": 1,
                "behind": 0,
                "fileStatus": [{"name": "src/lib.rs", "status": "modified"}],
            })))
            .mount(&server)
            .await;

        let backend = HttpSandboxBackend::for_base_url(&server.uri());
        let status = backend.git_status("sb1", "/repo").await.unwrap();
        assert_eq!(status.current_branch, "main");
        assert_eq!(status.file_status[0].status, "modified");
    }
}
