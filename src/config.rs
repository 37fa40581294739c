//! Server configuration — backend connection details and cache tuning.
//!
//! All settings come from CLI flags with environment-variable fallbacks, so
//! the binary drops into an MCP client config as a bare command plus env.
//! Nothing is persisted to disk; all state is in-memory and process-lifetime.

use clap::Parser;
use std::time::Duration;

/// Default handle-cache TTL in milliseconds.
pub const DEFAULT_CACHE_TTL_MS: u64 = 30_000;

#[derive(Debug, Clone, Parser)]
#[command(name = "sandbox-mcp", version, about = "MCP server for remote sandbox management")]
pub struct Config {
    /// Base URL of the sandbox backend API.
    #[arg(long, env = "SANDBOX_API_URL")]
    pub api_url: String,

    /// API key used as a bearer token on every backend call.
    #[arg(long, env = "SANDBOX_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Optional backend region/target forwarded on every request.
    #[arg(long, env = "SANDBOX_TARGET")]
    pub target: Option<String>,

    /// How long a resolved sandbox handle stays fresh before re-fetching.
    #[arg(long = "cache-ttl-ms", env = "SANDBOX_CACHE_TTL_MS", default_value_t = DEFAULT_CACHE_TTL_MS)]
    pub cache_ttl_ms: u64,

    /// Enable debug-level logging (written to stderr; stdout is the protocol channel).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_defaults_to_thirty_seconds() {
        let config = Config::parse_from(["sandbox-mcp", "--api-url", "https://api.example", "--api-key", "k"]);
        assert_eq!(config.cache_ttl(), Duration::from_millis(30_000));
        assert!(!config.verbose);
    }

    #[test]
    fn ttl_flag_overrides_default() {
        let config = Config::parse_from([
            "sandbox-mcp",
            "--api-url",
            "https://api.example",
            "--api-key",
            "k",
            "--cache-ttl-ms",
            "1000",
        ]);
        assert_eq!(config.cache_ttl(), Duration::from_millis(1000));
    }
}
