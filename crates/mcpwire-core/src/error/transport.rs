//! Classification and context for transport-level failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// Connection could not be established.
    ConnectionFailed,
    /// Connection was closed.
    ConnectionClosed,
    /// Read operation failed.
    ReadFailed,
    /// Write operation failed.
    WriteFailed,
    /// Operation timed out.
    Timeout,
    /// A frame could not be decoded.
    InvalidMessage,
    /// The peer violated the wire protocol.
    ProtocolViolation,
    /// The server no longer recognizes the session.
    SessionExpired,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ConnectionFailed => "connection failed",
            Self::ConnectionClosed => "connection closed",
            Self::ReadFailed => "read failed",
            Self::WriteFailed => "write failed",
            Self::Timeout => "timeout",
            Self::InvalidMessage => "invalid message",
            Self::ProtocolViolation => "protocol violation",
            Self::SessionExpired => "session expired",
        };
        f.write_str(text)
    }
}

/// Where a transport error happened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportContext {
    /// Transport type (stdio, http, memory).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,
    /// Remote endpoint (URL, command line).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
}

impl TransportContext {
    /// Create a new transport context for a specific transport type.
    #[must_use]
    pub fn new(transport_type: impl Into<String>) -> Self {
        Self {
            transport_type: Some(transport_type.into()),
            remote_addr: None,
        }
    }

    /// Set the remote address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}
