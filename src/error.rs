//! Error taxonomy for the sandbox MCP server.
//!
//! Every operation failure surfaces as one of four kinds so callers can
//! distinguish caller mistakes from backend trouble without parsing message
//! strings. Handlers never swallow backend errors; they propagate them
//! untouched and the server serializes them as a `{kind, message}` object.

use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The request arguments failed the operation's input schema.
    /// The operation was not attempted.
    #[error("{0}")]
    InvalidInput(String),

    /// The referenced sandbox, session, or path does not exist on the backend.
    #[error("{0}")]
    NotFound(String),

    /// Any other backend failure: network, auth, quota, internal.
    #[error("{0}")]
    Backend(String),

    /// The operation name is not registered. Misconfigured client.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl Error {
    /// Stable kind discriminant used in the wire-level error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::Backend(_) => "backend_error",
            Error::UnknownOperation(_) => "unknown_operation",
        }
    }

    /// Uniform `{kind, message}` shape returned to callers on failure.
    pub fn to_payload(&self) -> serde_json::Value {
        json!({
            "kind": self.kind(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        assert_eq!(Error::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(Error::NotFound("x".into()).kind(), "not_found");
        assert_eq!(Error::Backend("x".into()).kind(), "backend_error");
        assert_eq!(Error::UnknownOperation("x".into()).kind(), "unknown_operation");
    }

    #[test]
    fn payload_carries_kind_and_message() {
        let payload = Error::NotFound("sandbox missing-id not found".into()).to_payload();
        assert_eq!(payload["kind"], "not_found");
        assert_eq!(payload["message"], "sandbox missing-id not found");
    }
}
