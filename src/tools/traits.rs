//! Core tool abstraction shared by every operation handler.

use crate::error::Error;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Successful tool output, rendered as text content on the wire.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub output: String,
}

impl ToolResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// Pretty-printed JSON payload, for tools whose output is structured.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, Error> {
        let output = serde_json::to_string_pretty(value)
            .map_err(|e| Error::Backend(format!("failed to serialize result: {e}")))?;
        Ok(Self { output })
    }
}

/// A named, schema-validated operation.
///
/// Handlers are pure orchestration: parse typed arguments, resolve the
/// sandbox if the operation is sandbox-scoped, call exactly one backend
/// sub-API method, and map the outcome. They never swallow backend errors.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments, advertised in `tools/list`.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, Error>;
}

/// Deserialize raw arguments into a tool's typed argument struct.
///
/// Argument structs use `deny_unknown_fields`, so a stray field fails here
/// with `InvalidInput` before any backend call is attempted.
pub fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> Result<T, Error> {
    serde_json::from_value(args).map_err(|e| Error::InvalidInput(format!("invalid arguments: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    struct DemoArgs {
        sandbox_id: String,
    }

    #[test]
    fn parse_args_accepts_known_fields() {
        let args: DemoArgs = parse_args(serde_json::json!({"sandboxId": "sb1"})).unwrap();
        assert_eq!(args.sandbox_id, "sb1");
    }

    #[test]
    fn parse_args_rejects_unknown_fields() {
        let err = parse_args::<DemoArgs>(serde_json::json!({"badField": 1})).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn parse_args_rejects_wrong_types() {
        let err = parse_args::<DemoArgs>(serde_json::json!({"sandboxId": 7})).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
