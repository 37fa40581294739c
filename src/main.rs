use clap::Parser;
use sandbox_mcp::backend::http::HttpSandboxBackend;
use sandbox_mcp::resources::ResourceRegistry;
use sandbox_mcp::tools::build_registry;
use sandbox_mcp::{Config, McpServer, SandboxResolver};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // stdout carries the protocol, so every log line goes to stderr.
    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(
        api_url = %config.api_url,
        cache_ttl_ms = config.cache_ttl_ms,
        "starting sandbox MCP server"
    );

    let backend = Arc::new(HttpSandboxBackend::new(&config)?);
    let resolver = Arc::new(SandboxResolver::new(backend, config.cache_ttl()));
    let registry = build_registry(resolver.clone())?;
    let resources = ResourceRegistry::new(resolver);

    McpServer::new(registry, resources).run().await
}
