//! MCP server for a remote sandbox-management API.
//!
//! The crate is organized around one path for every operation:
//! stdio JSON-RPC ([`server`]) -> tool or resource dispatch ([`tools`],
//! [`resources`]) -> handle resolution ([`resolver`] over [`cache`]) ->
//! HTTP backend ([`backend`]).

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod resolver;
pub mod resources;
pub mod server;
pub mod tools;

pub use config::Config;
pub use error::Error;
pub use resolver::SandboxResolver;
pub use server::McpServer;
