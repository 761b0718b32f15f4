//! In-process transport.
//!
//! [`MemoryTransport::pair`] connects two endpoints with channels that carry
//! [`Message`] values directly: nothing is serialized, so the codec stage
//! never runs. Everything above the transport behaves exactly as it does
//! over a pipe.
//!
//! ```rust
//! use mcpwire_transport::{MemoryTransport, Transport};
//!
//! let (client_transport, server_transport) = MemoryTransport::pair();
//!
//! assert!(client_transport.is_connected());
//! assert!(server_transport.is_connected());
//! ```

use crate::error::TransportError;
use crate::runtime::AsyncMutex;
use crate::traits::{Transport, TransportMetadata};
use futures::channel::mpsc;
use mcpwire_core::protocol::Message;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// One end of an in-memory connection.
pub struct MemoryTransport {
    // Dropped on close so the peer's `recv` drains and then ends.
    sender: Mutex<Option<mpsc::Sender<Message>>>,
    receiver: AsyncMutex<mpsc::Receiver<Message>>,
    connected: AtomicBool,
    metadata: TransportMetadata,
}

impl MemoryTransport {
    /// Create a connected pair of memory transports.
    ///
    /// Messages sent on the first transport are received on the second,
    /// and vice versa.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(32)
    }

    /// Create a connected pair with a specific buffer capacity.
    #[must_use]
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(capacity);
        let (tx2, rx2) = mpsc::channel(capacity);

        let first = Self::new(tx2, rx1, "peer-0", "peer-1");
        let second = Self::new(tx1, rx2, "peer-1", "peer-0");
        (first, second)
    }

    fn new(
        sender: mpsc::Sender<Message>,
        receiver: mpsc::Receiver<Message>,
        local: &str,
        remote: &str,
    ) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: AsyncMutex::new(receiver),
            connected: AtomicBool::new(true),
            metadata: TransportMetadata::new("memory")
                .local_addr(local)
                .remote_addr(remote)
                .connected_now(),
        }
    }

    fn sender(&self) -> Option<mpsc::Sender<Message>> {
        self.sender
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
    }
}

impl Transport for MemoryTransport {
    type Error = TransportError;

    async fn send(&self, msg: Message) -> Result<(), Self::Error> {
        use futures::SinkExt;

        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let mut sender = self.sender().ok_or(TransportError::NotConnected)?;
        sender
            .send(msg)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn recv(&self) -> Result<Option<Message>, Self::Error> {
        use futures::StreamExt;

        let mut receiver = self.receiver.lock().await;
        if let Some(msg) = receiver.next().await {
            Ok(Some(msg))
        } else {
            self.connected.store(false, Ordering::SeqCst);
            Ok(None)
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn metadata(&self) -> TransportMetadata {
        self.metadata.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpwire_core::protocol::{Notification, Request, RequestId};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_memory_transport_pair() {
        let (client, server) = MemoryTransport::pair();

        assert!(client.is_connected());
        assert!(server.is_connected());
        assert_eq!(client.metadata().transport_type, "memory");
        assert!(client.metadata().bidirectional);
    }

    #[tokio::test]
    async fn test_send_receive() -> Result<(), TransportError> {
        let (client, server) = MemoryTransport::pair();

        let msg = Message::Request(Request::new("tools/list", RequestId::Number(1)));
        client.send(msg.clone()).await?;
        assert_eq!(server.recv().await?, Some(msg));

        let note = Message::Notification(Notification::new("notifications/initialized"));
        server.send(note.clone()).await?;
        assert_eq!(client.recv().await?, Some(note));
        Ok(())
    }

    #[tokio::test]
    async fn test_close_drains_then_ends_peer() -> Result<(), TransportError> {
        let (client, server) = MemoryTransport::pair();

        let msg = Message::Notification(Notification::new("notifications/progress"));
        client.send(msg.clone()).await?;
        client.close().await?;

        assert!(!client.is_connected());
        assert!(matches!(
            client.send(msg.clone()).await,
            Err(TransportError::NotConnected)
        ));
        assert_eq!(server.recv().await?, Some(msg));
        assert_eq!(server.recv().await?, None);
        assert!(!server.is_connected());
        Ok(())
    }

    #[test]
    fn test_needs_no_runtime() {
        let (client, server) = MemoryTransport::pair();
        let msg = Message::Request(Request::new("ping", RequestId::Number(7)));

        tokio_test::assert_ok!(tokio_test::block_on(client.send(msg.clone())));
        let received = tokio_test::assert_ok!(tokio_test::block_on(server.recv()));
        assert_eq!(received, Some(msg));
    }
}
