//! Transport error types.

use mcpwire_core::codec::DecodeError;
use mcpwire_core::error::{McpError, TransportContext, TransportDetails, TransportErrorKind};
use mcpwire_core::protocol::RequestId;
use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// I/O error from `std::io::Error`.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A message could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// One frame could not be decoded. The transport is still usable.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Transport is not connected.
    #[error("Not connected")]
    NotConnected,

    /// Message was too large.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual message size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Protocol error.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The server no longer knows our session.
    #[error("Session {session_id} expired or not found")]
    SessionExpired {
        /// The session id that was rejected.
        session_id: String,
    },

    /// One exchange failed without affecting the connection, such as an
    /// HTTP error status on a single POST.
    #[error("Request failed: {message}")]
    RequestFailed {
        /// The request the exchange carried, if it carried one.
        id: Option<RequestId>,
        /// HTTP status of the reply, when there was one.
        status: Option<u16>,
        /// What went wrong.
        message: String,
    },

    /// Timeout occurred.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// How long the operation waited.
        duration: std::time::Duration,
    },
}

impl TransportError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a per-exchange failure.
    pub fn request_failed(
        id: Option<RequestId>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::RequestFailed {
            id,
            status,
            message: message.into(),
        }
    }

    /// Whether the connection cannot continue after this error.
    ///
    /// Per-frame decode failures and per-exchange failures leave the
    /// transport usable.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Decode(_) | Self::RequestFailed { .. })
    }

    /// The request this error belongs to, when it belongs to exactly one.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Decode(decode) => decode.id.as_ref(),
            Self::RequestFailed { id, .. } => id.as_ref(),
            _ => None,
        }
    }

    /// Get the transport error kind.
    #[must_use]
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            Self::IoError(e) => match e.kind() {
                std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::NotConnected => TransportErrorKind::ConnectionFailed,
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::BrokenPipe => {
                    TransportErrorKind::ConnectionClosed
                }
                std::io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
                std::io::ErrorKind::WriteZero => TransportErrorKind::WriteFailed,
                _ => TransportErrorKind::ReadFailed,
            },
            Self::Json(_) => TransportErrorKind::WriteFailed,
            Self::Decode(_) | Self::MessageTooLarge { .. } => TransportErrorKind::InvalidMessage,
            Self::Connection { .. } | Self::NotConnected => TransportErrorKind::ConnectionFailed,
            Self::ConnectionClosed => TransportErrorKind::ConnectionClosed,
            Self::Protocol { .. }
            | Self::RequestFailed {
                status: Some(_), ..
            } => TransportErrorKind::ProtocolViolation,
            Self::RequestFailed { status: None, .. } => TransportErrorKind::ReadFailed,
            Self::SessionExpired { .. } => TransportErrorKind::SessionExpired,
            Self::Timeout { .. } => TransportErrorKind::Timeout,
        }
    }
}

impl From<TransportError> for McpError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Decode(decode) => decode.into(),
            TransportError::ConnectionClosed => Self::connection_closed("transport closed"),
            other => Self::Transport(Box::new(TransportDetails {
                kind: other.kind(),
                message: other.to_string(),
                context: TransportContext::default(),
                source: Some(Box::new(other)),
            })),
        }
    }
}
