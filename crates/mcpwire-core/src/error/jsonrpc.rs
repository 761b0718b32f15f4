//! The wire-level JSON-RPC error object and its conversion from `McpError`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::codes;
use super::types::McpError;

/// A JSON-RPC error object, as carried in the `error` member of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Create an error with an arbitrary code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Create an "invalid params" error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }

    /// Create an "internal error" (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    /// Create a "method not found" error (-32601).
    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, message)
    }

    /// Create a "parse error" (-32700).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, message)
    }

    /// Create an "invalid request" error (-32600).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, message)
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl From<&McpError> for JsonRpcError {
    fn from(err: &McpError) -> Self {
        // A peer's error passes through untouched so proxies stay transparent.
        if let McpError::Remote(remote) = err.root() {
            return remote.as_ref().clone();
        }

        let data = match err.root() {
            McpError::MethodNotFound { method, available } => Some(serde_json::json!({
                "method": method,
                "available": available,
            })),
            McpError::ToolNotFound { tool, available } => Some(serde_json::json!({
                "tool": tool,
                "available": available,
            })),
            McpError::InvalidParams(details) => Some(serde_json::json!({
                "method": details.method,
            })),
            McpError::ResourceNotFound { uri } => Some(serde_json::json!({ "uri": uri })),
            McpError::Transport(details) => Some(serde_json::json!({
                "kind": details.kind,
                "context": details.context,
            })),
            McpError::ToolExecution(details) => details
                .data
                .clone()
                .or_else(|| Some(serde_json::json!({ "tool": details.tool }))),
            McpError::HandshakeFailed(details) => Some(serde_json::json!({
                "local_version": details.local_version,
                "peer_version": details.peer_version,
            })),
            _ => None,
        };

        Self {
            code: err.code(),
            message: err.to_string(),
            data,
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        Self::from(&err)
    }
}
