//! Newline-delimited JSON over a byte stream.
//!
//! Each JSON-RPC message is one line of JSON followed by `\n`. Blank lines
//! are skipped. Frames go through [`mcpwire_core::codec`], so a malformed
//! line surfaces as [`TransportError::Decode`] and the stream stays usable.
//!
//! Servers launched as subprocesses use [`StdioTransport::stdio`]; anything
//! written to stdout that is not a frame corrupts the stream, so logs belong
//! on stderr.
//!
//! To launch a server, use [`SpawnedTransport`](crate::SpawnedTransport).

use crate::error::TransportError;
use crate::runtime::{AsyncMutex, LineReader};
use crate::traits::{Transport, TransportMetadata};
use futures::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use mcpwire_core::codec::{self, DecodeError};
use mcpwire_core::protocol::Message;
use std::sync::atomic::{AtomicBool, Ordering};

/// Maximum allowed message size (16 MB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A transport over any async reader/writer pair.
pub struct StdioTransport<R, W> {
    reader: AsyncMutex<LineReader<R>>,
    writer: AsyncMutex<W>,
    connected: AtomicBool,
    metadata: TransportMetadata,
}

#[cfg(feature = "tokio-runtime")]
impl
    StdioTransport<
        crate::runtime::TokioAsyncReadWrapper<tokio::io::Stdin>,
        crate::runtime::TokioAsyncWriteWrapper<tokio::io::Stdout>,
    >
{
    /// A transport on this process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::with_streams(crate::runtime::stdin(), crate::runtime::stdout()).with_metadata(
            TransportMetadata::new("stdio")
                .remote_addr("stdin")
                .local_addr("stdout")
                .connected_now(),
        )
    }
}

#[cfg(feature = "tokio-runtime")]
impl<R, W> StdioTransport<crate::runtime::TokioAsyncReadWrapper<R>, crate::runtime::TokioAsyncWriteWrapper<W>>
where
    R: tokio::io::AsyncRead + Unpin + Send,
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    /// A transport over Tokio I/O types, such as the two halves of
    /// `tokio::io::duplex`.
    #[must_use]
    pub fn from_tokio(reader: R, writer: W) -> Self {
        Self::with_streams(
            crate::runtime::TokioAsyncReadWrapper(reader),
            crate::runtime::TokioAsyncWriteWrapper(writer),
        )
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a transport with custom readers/writers.
    #[must_use]
    pub fn with_streams(reader: R, writer: W) -> Self {
        Self {
            reader: AsyncMutex::new(LineReader::new(reader, MAX_MESSAGE_SIZE)),
            writer: AsyncMutex::new(writer),
            connected: AtomicBool::new(true),
            metadata: TransportMetadata::new("stdio")
                .remote_addr("custom")
                .local_addr("custom")
                .connected_now(),
        }
    }

    /// Replace the reported metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: TransportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Flush and shut down the write half.
    pub(crate) async fn shutdown_writer(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await?;
        writer.close().await?;
        Ok(())
    }
}

impl<R, W> Transport for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    type Error = TransportError;

    async fn send(&self, msg: Message) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let json = codec::encode(&msg)?;
        if json.len() > MAX_MESSAGE_SIZE {
            return Err(TransportError::MessageTooLarge {
                size: json.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Message>, Self::Error> {
        let mut reader = self.reader.lock().await;

        loop {
            let Some(line) = reader.read_line().await? else {
                self.connected.store(false, Ordering::SeqCst);
                return Ok(None);
            };

            let text = std::str::from_utf8(&line)
                .map_err(|e| DecodeError::unattributed(format!("frame is not UTF-8: {e}")))?;
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            tracing::trace!(len = text.len(), "read frame");
            return Ok(Some(codec::decode(text)?));
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        let mut writer = self.writer.lock().await;
        writer.flush().await?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn metadata(&self) -> TransportMetadata {
        self.metadata.clone()
    }
}

#[cfg(all(test, feature = "tokio-runtime"))]
mod tests {
    use super::*;
    use mcpwire_core::codec::FrameKind;
    use mcpwire_core::protocol::{Request, RequestId, Response};
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt as _, BufReader};

    #[tokio::test]
    async fn test_writes_one_line_per_message() -> Result<(), Box<dyn std::error::Error>> {
        let (ours, theirs) = tokio::io::duplex(4096);
        let (our_read, our_write) = tokio::io::split(ours);
        let transport = StdioTransport::from_tokio(our_read, our_write);

        transport
            .send(Message::Request(Request::new("ping", RequestId::Number(0))))
            .await?;

        let mut lines = BufReader::new(theirs).lines();
        assert_eq!(
            lines.next_line().await?.as_deref(),
            Some(r#"{"jsonrpc":"2.0","id":0,"method":"ping"}"#)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_frame_does_not_end_stream() -> Result<(), Box<dyn std::error::Error>> {
        let (ours, mut theirs) = tokio::io::duplex(4096);
        let (our_read, our_write) = tokio::io::split(ours);
        let transport = StdioTransport::from_tokio(our_read, our_write);

        theirs
            .write_all(b"\n{\"jsonrpc\":\"2.0\",\"id\":7}\n{\"jsonrpc\":\"2.0\",\"id\":8,\"result\":{}}\n")
            .await?;
        drop(theirs);

        match transport.recv().await {
            Err(TransportError::Decode(err)) => {
                assert_eq!(err.id, Some(RequestId::Number(7)));
                assert_eq!(err.kind, FrameKind::Response);
            }
            other => panic!("expected decode error, got {other:?}"),
        }
        assert_eq!(
            transport.recv().await?,
            Some(Message::Response(Response::success(8u64, serde_json::json!({}))))
        );
        assert_eq!(transport.recv().await?, None);
        assert!(!transport.is_connected());
        Ok(())
    }

    #[test]
    fn test_max_message_size() {
        assert_eq!(MAX_MESSAGE_SIZE, 16 * 1024 * 1024);
    }
}
