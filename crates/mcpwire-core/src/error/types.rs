//! The primary error type for the SDK.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use super::codes;
use super::details::{
    BoxError, HandshakeDetails, InvalidParamsDetails, ToolExecutionDetails, TransportDetails,
};
use super::jsonrpc::JsonRpcError;
use super::transport::{TransportContext, TransportErrorKind};

/// The primary error type for the SDK.
///
/// Every failure an embedding application can observe flows through this
/// enum. The variants fall into a few categories:
///
/// - connection-terminal: [`Transport`](Self::Transport), [`ConnectionClosed`](Self::ConnectionClosed)
/// - protocol: [`Parse`](Self::Parse), [`InvalidRequest`](Self::InvalidRequest),
///   [`HandshakeFailed`](Self::HandshakeFailed)
/// - per request: [`MethodNotFound`](Self::MethodNotFound), [`InvalidParams`](Self::InvalidParams),
///   [`ToolNotFound`](Self::ToolNotFound), [`ResourceNotFound`](Self::ResourceNotFound)
/// - the peer said no: [`Remote`](Self::Remote)
/// - we gave up: [`Cancelled`](Self::Cancelled), [`Timeout`](Self::Timeout)
///
/// Large variants are boxed to keep `Result<T, McpError>` small.
#[derive(Error, Diagnostic, Debug)]
pub enum McpError {
    /// Invalid JSON, or a frame that is not a JSON-RPC 2.0 message.
    #[error("Parse error: {message}")]
    #[diagnostic(
        code(mcp::protocol::parse_error),
        help("Ensure the message is valid JSON-RPC 2.0 format")
    )]
    Parse {
        /// Human-readable error message.
        message: String,
        /// The underlying parse error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// The JSON sent is not a valid Request object, or arrived in the wrong state.
    #[error("Invalid request: {message}")]
    #[diagnostic(code(mcp::protocol::invalid_request))]
    InvalidRequest {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// The method does not exist or is not served on this connection.
    #[error("Method not found: {method}")]
    #[diagnostic(code(mcp::protocol::method_not_found))]
    MethodNotFound {
        /// The method that was requested.
        method: String,
        /// Methods that are available.
        available: Box<[String]>,
    },

    /// Invalid method parameter(s).
    #[error("Invalid params for '{}': {}", .0.method, .0.message)]
    #[diagnostic(code(mcp::protocol::invalid_params))]
    InvalidParams(#[source] Box<InvalidParamsDetails>),

    /// Internal error.
    #[error("Internal error: {message}")]
    #[diagnostic(code(mcp::protocol::internal_error), severity(error))]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// Transport-level error.
    #[error("Transport error ({}): {}", .0.kind, .0.message)]
    #[diagnostic(code(mcp::transport::error))]
    Transport(#[source] Box<TransportDetails>),

    /// The connection closed before the operation could complete.
    #[error("Connection closed: {reason}")]
    #[diagnostic(
        code(mcp::connection::closed),
        help("Start a new session to continue")
    )]
    ConnectionClosed {
        /// Why the connection closed.
        reason: String,
    },

    /// `tools/call` named a tool that is not registered.
    #[error("Unknown tool: {tool}")]
    #[diagnostic(code(mcp::tool::not_found), help("Call tools/list to see available tools"))]
    ToolNotFound {
        /// The tool that was requested.
        tool: String,
        /// Registered tool names.
        available: Box<[String]>,
    },

    /// A tool execution failed.
    #[error("Tool '{}' failed: {}", .0.tool, .0.message)]
    #[diagnostic(code(mcp::tool::execution_error))]
    ToolExecution(#[source] Box<ToolExecutionDetails>),

    /// A requested resource was not found.
    #[error("Resource not found: {uri}")]
    #[diagnostic(
        code(mcp::resource::not_found),
        help("Verify the URI is correct and the resource exists")
    )]
    ResourceNotFound {
        /// The URI of the resource that was not found.
        uri: String,
    },

    /// Protocol handshake failed.
    #[error("Handshake failed: {}", .0.message)]
    #[diagnostic(code(mcp::handshake::failed))]
    HandshakeFailed(#[source] Box<HandshakeDetails>),

    /// The peer did not declare a capability the operation needs.
    #[error("Capability not supported: {capability}")]
    #[diagnostic(code(mcp::capability::not_supported))]
    CapabilityNotSupported {
        /// The capability that was needed.
        capability: String,
    },

    /// Invalid local setup, detected before any message is exchanged.
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(mcp::configuration))]
    Configuration {
        /// What is wrong.
        message: String,
    },

    /// User rejected an operation.
    #[error("User rejected: {message}")]
    #[diagnostic(code(mcp::user::rejected))]
    UserRejected {
        /// Human-readable message about what was rejected.
        message: String,
    },

    /// An operation timed out.
    #[error("Timeout after {duration:?}: {operation}")]
    #[diagnostic(
        code(mcp::timeout),
        help("Consider increasing the timeout or checking connectivity")
    )]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// How long we waited.
        duration: Duration,
    },

    /// An operation was cancelled locally.
    #[error("Operation cancelled: {operation}")]
    #[diagnostic(code(mcp::cancelled))]
    Cancelled {
        /// The operation that was cancelled.
        operation: String,
        /// Reason for cancellation, if provided.
        reason: Option<String>,
    },

    /// The peer answered a request with a JSON-RPC error.
    #[error("Peer returned error {}: {}", .0.code, .0.message)]
    #[diagnostic(code(mcp::remote))]
    Remote(Box<JsonRpcError>),

    /// An error with additional context.
    #[error("{context}: {source}")]
    #[diagnostic(code(mcp::context))]
    WithContext {
        /// The context message.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<McpError>,
    },
}

impl McpError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a parse error with a source.
    pub fn parse_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Create a method not found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
            available: Box::new([]),
        }
    }

    /// Create a method not found error listing what is available.
    pub fn method_not_found_with_suggestions(
        method: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        Self::MethodNotFound {
            method: method.into(),
            available: available.into_boxed_slice(),
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams(Box::new(InvalidParamsDetails {
            method: method.into(),
            message: message.into(),
            source: None,
        }))
    }

    /// Create an invalid params error from a deserialization failure.
    pub fn invalid_params_from(method: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidParams(Box::new(InvalidParamsDetails {
            method: method.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }))
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with a source.
    pub fn internal_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a transport error.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport(Box::new(TransportDetails {
            kind,
            message: message.into(),
            context: TransportContext::default(),
            source: None,
        }))
    }

    /// Create a transport error with context.
    pub fn transport_with_context(
        kind: TransportErrorKind,
        message: impl Into<String>,
        context: TransportContext,
    ) -> Self {
        Self::Transport(Box::new(TransportDetails {
            kind,
            message: message.into(),
            context,
            source: None,
        }))
    }

    /// Create a connection closed error.
    pub fn connection_closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>, available: Vec<String>) -> Self {
        Self::ToolNotFound {
            tool: tool.into(),
            available: available.into_boxed_slice(),
        }
    }

    /// Create a tool execution error.
    pub fn tool_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution(Box::new(ToolExecutionDetails {
            tool: tool.into(),
            message: message.into(),
            data: None,
            source: None,
        }))
    }

    /// Create a tool execution error carrying structured data.
    pub fn tool_error_with_data(
        tool: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self::ToolExecution(Box::new(ToolExecutionDetails {
            tool: tool.into(),
            message: message.into(),
            data: Some(data),
            source: None,
        }))
    }

    /// Create a resource not found error.
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Self::ResourceNotFound { uri: uri.into() }
    }

    /// Create a handshake failed error.
    pub fn handshake_failed(message: impl Into<String>) -> Self {
        Self::HandshakeFailed(Box::new(HandshakeDetails {
            message: message.into(),
            local_version: None,
            peer_version: None,
            source: None,
        }))
    }

    /// Create a handshake failed error with version info.
    pub fn handshake_failed_with_versions(
        message: impl Into<String>,
        local_version: Option<String>,
        peer_version: Option<String>,
    ) -> Self {
        Self::HandshakeFailed(Box::new(HandshakeDetails {
            message: message.into(),
            local_version,
            peer_version,
            source: None,
        }))
    }

    /// Create a capability not supported error.
    pub fn capability_not_supported(capability: impl Into<String>) -> Self {
        Self::CapabilityNotSupported {
            capability: capability.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a user rejected error.
    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::UserRejected {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
            reason: None,
        }
    }

    /// Create a cancelled error with reason.
    pub fn cancelled_with_reason(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
            reason: Some(reason.into()),
        }
    }

    /// Wrap an error received from the peer.
    pub fn remote(error: JsonRpcError) -> Self {
        Self::Remote(Box::new(error))
    }

    /// Wrap this error with a context message.
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through context layers.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::WithContext { source, .. } = current {
            current = source;
        }
        current
    }

    /// Get the JSON-RPC error code for this error.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self.root() {
            Self::Parse { .. } => codes::PARSE_ERROR,
            Self::InvalidRequest { .. } => codes::INVALID_REQUEST,
            Self::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::ToolNotFound { .. } => codes::INVALID_PARAMS,
            Self::Internal { .. } => codes::INTERNAL_ERROR,
            Self::Transport(_) => codes::SERVER_ERROR_START,
            Self::ToolExecution(_) => codes::SERVER_ERROR_START - 1,
            Self::ResourceNotFound { .. } => codes::RESOURCE_NOT_FOUND,
            Self::ConnectionClosed { .. } => codes::SERVER_ERROR_START - 3,
            Self::HandshakeFailed(_) => codes::SERVER_ERROR_START - 5,
            Self::CapabilityNotSupported { .. } => codes::SERVER_ERROR_START - 6,
            Self::Timeout { .. } => codes::SERVER_ERROR_START - 7,
            Self::Cancelled { .. } => codes::SERVER_ERROR_START - 8,
            Self::Configuration { .. } => codes::SERVER_ERROR_START - 9,
            Self::UserRejected { .. } => codes::USER_REJECTED,
            Self::Remote(error) => error.code,
            Self::WithContext { source, .. } => source.code(),
        }
    }

    /// Whether the operation was abandoned locally (cancellation or timeout).
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self.root(), Self::Cancelled { .. } | Self::Timeout { .. })
    }

    /// Whether the connection is gone.
    #[must_use]
    pub fn is_connection_closed(&self) -> bool {
        match self.root() {
            Self::ConnectionClosed { .. } => true,
            Self::Transport(details) => details.kind == TransportErrorKind::ConnectionClosed,
            _ => false,
        }
    }

    /// Whether the peer answered with an error response.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.root(), Self::Remote(_))
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_with_source("JSON serialization/deserialization error", err)
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let kind = match err.kind() {
            ErrorKind::NotFound | ErrorKind::ConnectionRefused => {
                TransportErrorKind::ConnectionFailed
            }
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
                TransportErrorKind::ConnectionClosed
            }
            ErrorKind::TimedOut => TransportErrorKind::Timeout,
            ErrorKind::WriteZero => TransportErrorKind::WriteFailed,
            _ => TransportErrorKind::ReadFailed,
        };
        let message = err.to_string();
        Self::Transport(Box::new(TransportDetails {
            kind,
            message,
            context: TransportContext::default(),
            source: Some(Box::new(err)),
        }))
    }
}

impl From<JsonRpcError> for McpError {
    fn from(err: JsonRpcError) -> Self {
        Self::remote(err)
    }
}
