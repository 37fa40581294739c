//! Stdio JSON-RPC 2.0 request router.
//!
//! Reads one request per line from stdin, writes one response per line to
//! stdout. Each request is handled in its own task, so slow backend calls do
//! not serialize independent operations; a single writer task keeps response
//! lines from interleaving. All logging goes to stderr.
//!
//! Protocol flow:
//!   1. Client sends `initialize` -> server returns capabilities
//!   2. Client sends `notifications/initialized`
//!   3. Client sends `tools/list` / `resources/list`
//!   4. Client sends `tools/call` / `resources/read`

use crate::error::Error;
use crate::resources::ResourceRegistry;
use crate::tools::ToolRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    registry: ToolRegistry,
    resources: ResourceRegistry,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, resources: ResourceRegistry) -> Self {
        Self {
            registry,
            resources,
        }
    }

    /// Serve requests from stdin until EOF.
    pub async fn run(self) -> anyhow::Result<()> {
        let server = Arc::new(self);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = rx.recv().await {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let request: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(e) => {
                    warn!("discarding unparseable request line: {e}");
                    continue;
                }
            };

            let server = server.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle(request).await {
                    let _ = tx.send(response.to_string());
                }
            });
        }

        drop(tx);
        writer.await??;
        Ok(())
    }

    /// Handle a single request. Returns `None` for notifications, which get
    /// no response per the JSON-RPC spec.
    async fn handle(&self, request: Value) -> Option<Value> {
        let id = request.get("id").cloned().filter(|v| !v.is_null());
        let method = request
            .get("method")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
        debug!(method = %method, "handling request");

        let body: Result<Value, Value> = match method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {},
                },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
            "notifications/initialized" | "initialized" => return None,
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.describe() })),
            "tools/call" => {
                let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
                let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
                match self.registry.invoke(name, arguments).await {
                    Ok(result) => Ok(json!({
                        "content": [{"type": "text", "text": result.output}],
                        "isError": false,
                    })),
                    // Tool failures are results, not protocol errors: the
                    // uniform {kind, message} payload rides in the content.
                    Err(e) => Ok(json!({
                        "content": [{"type": "text", "text": e.to_payload().to_string()}],
                        "isError": true,
                    })),
                }
            }
            "resources/list" => Ok(json!({ "resources": self.resources.describe() })),
            "resources/read" => {
                let uri = params.get("uri").and_then(|u| u.as_str()).unwrap_or("");
                match self.resources.read(uri).await {
                    Ok(text) => Ok(json!({
                        "contents": [{
                            "uri": uri,
                            "mimeType": "application/json",
                            "text": text,
                        }],
                    })),
                    Err(e) => Err(json!({
                        "code": rpc_error_code(&e),
                        "message": e.to_string(),
                        "data": e.to_payload(),
                    })),
                }
            }
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => {
                if id.is_none() {
                    // Unknown notifications are silently ignored.
                    return None;
                }
                Err(json!({
                    "code": -32601,
                    "message": format!("Method not found: {method}"),
                }))
            }
        };

        id.as_ref()?;
        let id = id.unwrap_or(Value::Null);
        Some(match body {
            Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            Err(error) => json!({"jsonrpc": "2.0", "id": id, "error": error}),
        })
    }
}

fn rpc_error_code(error: &Error) -> i64 {
    match error {
        Error::InvalidInput(_) => -32602,
        Error::NotFound(_) => -32002,
        Error::Backend(_) | Error::UnknownOperation(_) => -32603,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::StubBackend;
    use crate::resolver::SandboxResolver;
    use crate::tools::build_registry;
    use std::time::Duration;

    fn server(backend: Arc<StubBackend>) -> McpServer {
        let resolver = Arc::new(SandboxResolver::new(backend, Duration::from_secs(30)));
        let registry = build_registry(resolver.clone()).unwrap();
        McpServer::new(registry, ResourceRegistry::new(resolver))
    }

    #[tokio::test]
    async fn initialize_reports_capabilities() {
        let server = server(Arc::new(StubBackend::default()));
        let response = server
            .handle(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}))
            .await
            .unwrap();
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = server(Arc::new(StubBackend::default()));
        let response = server
            .handle(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn tools_list_advertises_all_tools() {
        let server = server(Arc::new(StubBackend::default()));
        let response = server
            .handle(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await
            .unwrap();
        assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 28);
    }

    #[tokio::test]
    async fn tools_call_surfaces_typed_errors_in_content() {
        let server = server(Arc::new(StubBackend::default()));
        let response = server
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "get-sandbox", "arguments": {"sandboxId": "missing"}},
            }))
            .await
            .unwrap();
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("not_found"));
    }

    #[tokio::test]
    async fn tools_call_success_returns_text_content() {
        let server = server(Arc::new(StubBackend::with_sandbox("sb1")));
        let response = server
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "get-sandbox", "arguments": {"sandboxId": "sb1"}},
            }))
            .await
            .unwrap();
        assert_eq!(response["result"]["isError"], false);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("sb1"));
    }

    #[tokio::test]
    async fn resources_read_returns_document() {
        let server = server(Arc::new(StubBackend::with_sandbox("sb1")));
        let response = server
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "resources/read",
                "params": {"uri": "sandbox://sandboxes"},
            }))
            .await
            .unwrap();
        let text = response["result"]["contents"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"total\": 1"));
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let server = server(Arc::new(StubBackend::default()));
        let response = server
            .handle(json!({"jsonrpc": "2.0", "id": 6, "method": "bogus/method"}))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32601);
    }
}
