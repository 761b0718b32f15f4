//! The transport abstraction.
//!
//! A [`Transport`] moves whole [`Message`]s. Framing and decoding are its
//! business; correlation, routing and lifecycle are the session's. All
//! methods take `&self` so that one task can sit in [`Transport::recv`] while
//! another calls [`Transport::send`].

use mcpwire_core::protocol::Message;
use std::future::Future;
use std::time::Instant;

/// Metadata about a transport connection.
#[derive(Debug, Clone, Default)]
pub struct TransportMetadata {
    /// Transport type identifier (e.g., "stdio", "http", "memory").
    pub transport_type: String,
    /// Remote address, if applicable.
    pub remote_addr: Option<String>,
    /// Local address, if applicable.
    pub local_addr: Option<String>,
    /// When the connection was established.
    pub connected_at: Option<Instant>,
    /// Whether the peer can send requests that expect a reply over this
    /// transport. Server-to-client sampling needs this.
    pub bidirectional: bool,
    /// Custom metadata specific to the transport type.
    pub custom: Option<serde_json::Value>,
}

impl TransportMetadata {
    /// Create new metadata for a transport type.
    #[must_use]
    pub fn new(transport_type: impl Into<String>) -> Self {
        Self {
            transport_type: transport_type.into(),
            remote_addr: None,
            local_addr: None,
            connected_at: None,
            bidirectional: true,
            custom: None,
        }
    }

    /// Set the remote address.
    #[must_use]
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Set the local address.
    #[must_use]
    pub fn local_addr(mut self, addr: impl Into<String>) -> Self {
        self.local_addr = Some(addr.into());
        self
    }

    /// Mark the connection time.
    #[must_use]
    pub fn connected_now(mut self) -> Self {
        self.connected_at = Some(Instant::now());
        self
    }

    /// Set bidirectional flag.
    #[must_use]
    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Attach transport-specific metadata.
    #[must_use]
    pub fn custom(mut self, custom: serde_json::Value) -> Self {
        self.custom = Some(custom);
        self
    }
}

/// Core transport trait for MCP communication.
///
/// Implementations must tolerate `send` and `recv` running concurrently
/// from different tasks. `recv` returning `Ok(None)` is an orderly end of
/// stream; an `Err` other than [`TransportError::Decode`] ends the
/// connection.
///
/// [`TransportError::Decode`]: crate::TransportError::Decode
pub trait Transport: Send + Sync {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a message over the transport.
    fn send(&self, msg: Message) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next message.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&self) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send;

    /// Close the transport connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Check if the transport is still connected.
    fn is_connected(&self) -> bool;

    /// Get metadata about the transport.
    fn metadata(&self) -> TransportMetadata;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let meta = TransportMetadata::new("stdio")
            .remote_addr("stdin")
            .local_addr("stdout")
            .connected_now();

        assert_eq!(meta.transport_type, "stdio");
        assert!(meta.remote_addr.is_some());
        assert!(meta.connected_at.is_some());
        assert!(meta.bidirectional);
        assert!(!meta.bidirectional(false).bidirectional);
    }
}
