//! Runtime glue for the byte-stream transports.
//!
//! The stream transports are written against `futures::io`; the wrappers
//! here adapt Tokio's I/O types to those traits. [`LineReader`] provides
//! newline framing with a size cap.

use bytes::{Bytes, BytesMut};
use futures::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::TransportError;

/// A runtime-agnostic async mutex.
pub use async_lock::Mutex as AsyncMutex;

// =============================================================================
// Stdio Abstraction
// =============================================================================

/// The process's stdin as a `futures::io::AsyncRead`.
#[cfg(feature = "tokio-runtime")]
#[must_use]
pub fn stdin() -> TokioAsyncReadWrapper<tokio::io::Stdin> {
    TokioAsyncReadWrapper(tokio::io::stdin())
}

/// The process's stdout as a `futures::io::AsyncWrite`.
#[cfg(feature = "tokio-runtime")]
#[must_use]
pub fn stdout() -> TokioAsyncWriteWrapper<tokio::io::Stdout> {
    TokioAsyncWriteWrapper(tokio::io::stdout())
}

// =============================================================================
// Tokio Compatibility Wrappers
// =============================================================================

/// Wrapper to convert Tokio's `AsyncRead` to `futures::io::AsyncRead`
#[cfg(feature = "tokio-runtime")]
#[derive(Debug)]
pub struct TokioAsyncReadWrapper<T>(pub T);

#[cfg(feature = "tokio-runtime")]
impl<T: tokio::io::AsyncRead + Unpin> AsyncRead for TokioAsyncReadWrapper<T> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let mut read_buf = tokio::io::ReadBuf::new(buf);
        match Pin::new(&mut self.0).poll_read(cx, &mut read_buf) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(read_buf.filled().len())),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Wrapper to convert Tokio's `AsyncWrite` to `futures::io::AsyncWrite`
#[cfg(feature = "tokio-runtime")]
#[derive(Debug)]
pub struct TokioAsyncWriteWrapper<T>(pub T);

#[cfg(feature = "tokio-runtime")]
impl<T: tokio::io::AsyncWrite + Unpin> AsyncWrite for TokioAsyncWriteWrapper<T> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}

// =============================================================================
// Line framing
// =============================================================================

const READ_CHUNK: usize = 8 * 1024;

/// A newline-framed reader.
///
/// All partial data lives in the reader itself, so dropping a pending
/// [`read_line`](Self::read_line) future (for example from a `select!`) loses
/// nothing: the next call resumes where the last one stopped.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buffer: BytesMut,
    // Prefix of `buffer` already known to contain no newline.
    scanned: usize,
    max_line: usize,
}

impl<R> LineReader<R> {
    /// Create a reader that rejects lines longer than `max_line` bytes.
    pub fn new(inner: R, max_line: usize) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            max_line,
        }
    }

    /// Returns the number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Read the next line, without its terminator.
    ///
    /// Returns `Ok(None)` at end of stream. A trailing line without a newline
    /// is still returned.
    pub async fn read_line(&mut self) -> Result<Option<Bytes>, TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(pos) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
                let end = self.scanned + pos;
                let mut line = self.buffer.split_to(end + 1);
                self.scanned = 0;
                if end > self.max_line {
                    return Err(TransportError::MessageTooLarge {
                        size: end,
                        max: self.max_line,
                    });
                }
                line.truncate(end);
                if line.last() == Some(&b'\r') {
                    line.truncate(end - 1);
                }
                return Ok(Some(line.freeze()));
            }
            self.scanned = self.buffer.len();

            if self.buffer.len() > self.max_line {
                return Err(TransportError::MessageTooLarge {
                    size: self.buffer.len(),
                    max: self.max_line,
                });
            }

            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                self.scanned = 0;
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.buffer.split().freeze()));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}
