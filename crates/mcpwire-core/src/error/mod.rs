//! Unified error handling.
//!
//! All failures flow through [`McpError`]. Errors that cross the wire are
//! converted to and from [`JsonRpcError`]: local failures become error
//! responses through `JsonRpcError::from(&McpError)`, and error responses
//! received from the peer surface as [`McpError::Remote`] with the code intact.
//!
//! Tool failures are the exception. A tool that fails returns an in-band
//! `CallToolResult` with `isError: true` so the model can read the message;
//! only protocol problems (unknown tool, malformed arguments) become JSON-RPC
//! errors.
//!
//! ```rust
//! use mcpwire_core::error::{McpError, McpResultExt, INVALID_PARAMS};
//!
//! fn call() -> Result<(), McpError> {
//!     Err(McpError::tool_not_found("weather", vec!["echo".to_string()]))
//! }
//!
//! let err = call().context("tools/call (id 3)").unwrap_err();
//! assert_eq!(err.code(), INVALID_PARAMS);
//! ```

pub mod codes;
mod context;
mod details;
mod jsonrpc;
mod transport;
mod types;

pub use codes::*;
pub use context::McpResultExt;
pub use details::{
    BoxError, HandshakeDetails, InvalidParamsDetails, ToolExecutionDetails, TransportDetails,
};
pub use jsonrpc::JsonRpcError;
pub use transport::{TransportContext, TransportErrorKind};
pub use types::McpError;
