//! Sandbox lifecycle tools: create, get, list, start, stop, remove.
//!
//! Thin orchestration over [`crate::backend::SandboxBackend`]; every
//! sandbox-scoped tool goes through [`crate::resolver::SandboxResolver`]
//! first, so handle freshness is accounted for in exactly one place.

pub mod create;
pub mod lifecycle;

pub use create::CreateSandboxTool;
pub use lifecycle::{
    GetSandboxTool, ListSandboxesTool, RemoveSandboxTool, StartSandboxTool, StopSandboxTool,
};
