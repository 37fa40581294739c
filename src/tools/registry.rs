//! Operation registry — maps tool names to handlers.
//!
//! Registered once at startup and read-only afterwards. Duplicate names are
//! a wiring bug, so registration fails fast and the process refuses to boot.

use super::traits::{Tool, ToolResult};
use crate::error::Error;
use anyhow::bail;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails on a duplicate name — startup-time fatal.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> anyhow::Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            bail!("duplicate tool registration: {name}");
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Tool descriptors for `tools/list`, in registration order.
    pub fn describe(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": tool.parameters_schema(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up the named tool and run it against raw arguments.
    pub async fn invoke(&self, name: &str, args: serde_json::Value) -> Result<ToolResult, Error> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))?;

        info!(tool = %name, "invoking tool");
        let result = tool.execute(args).await;
        if let Err(e) = &result {
            warn!(tool = %name, kind = e.kind(), "tool failed: {e}");
        }
        result
    }
}
