//! Server-Sent Events (SSE) parsing utilities.

use bytes::BytesMut;

use crate::error::TransportError;

/// Accumulates an SSE byte stream and splits it into events.
///
/// Chunks may end anywhere, even inside a UTF-8 sequence, so the buffer
/// works on bytes and only decodes complete events.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buffer: BytesMut,
    last_event_id: Option<String>,
}

impl SseBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk from the stream.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// The `id:` of the last complete event, for resumption.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Remove every complete event and return their `data:` payloads.
    ///
    /// Events without data (keep-alives, comments) yield nothing.
    pub fn drain_events(&mut self, max_message_size: usize) -> Result<Vec<String>, TransportError> {
        let mut payloads = Vec::new();

        while let Some((end, delimiter)) = find_event_end(&self.buffer) {
            let raw = self.buffer.split_to(end + delimiter);
            let event = String::from_utf8_lossy(&raw[..end]);

            let mut data_lines = Vec::new();
            for line in event.lines() {
                if let Some(id) = line.strip_prefix("id:") {
                    self.last_event_id = Some(id.trim().to_string());
                } else if let Some(data) = line.strip_prefix("data:") {
                    data_lines.push(data.strip_prefix(' ').unwrap_or(data));
                }
                // `event:`, `retry:` and `:` comments carry nothing we use.
            }

            let data = data_lines.join("\n");
            if data.is_empty() {
                continue;
            }
            if data.len() > max_message_size {
                return Err(TransportError::MessageTooLarge {
                    size: data.len(),
                    max: max_message_size,
                });
            }
            payloads.push(data);
        }

        if self.buffer.len() > max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: self.buffer.len(),
                max: max_message_size,
            });
        }
        Ok(payloads)
    }
}

// Position of the first blank line and the length of its delimiter.
fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MAX: usize = 16 * 1024 * 1024;

    #[test]
    fn test_sse_buffer_parsing() -> Result<(), TransportError> {
        let mut sse = SseBuffer::new();
        sse.push(b"id: evt-001\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n");

        let events = sse.drain_events(MAX)?;
        assert_eq!(events, vec![r#"{"jsonrpc":"2.0","id":1,"result":{}}"#.to_string()]);
        assert_eq!(sse.last_event_id(), Some("evt-001"));
        Ok(())
    }

    #[test]
    fn test_events_split_across_chunks() -> Result<(), TransportError> {
        let mut sse = SseBuffer::new();
        let text = "data: {\"text\":\"caf\u{e9}\"}\n\nid: 2\r\ndata: {}\r\n\r\n";
        let bytes = text.as_bytes();
        // Split inside the two-byte `é`.
        let cut = text.find('\u{e9}').map_or(0, |i| i + 1);

        sse.push(&bytes[..cut]);
        assert!(sse.drain_events(MAX)?.is_empty());
        sse.push(&bytes[cut..]);

        let events = sse.drain_events(MAX)?;
        assert_eq!(events, vec!["{\"text\":\"caf\u{e9}\"}".to_string(), "{}".to_string()]);
        assert_eq!(sse.last_event_id(), Some("2"));
        Ok(())
    }

    #[test]
    fn test_keepalive_comments_yield_nothing() -> Result<(), TransportError> {
        let mut sse = SseBuffer::new();
        sse.push(b": keep-alive\n\nevent: message\n\n");
        assert!(sse.drain_events(MAX)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_sse_buffer_message_too_large() {
        let mut sse = SseBuffer::new();
        sse.push(b"data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n");
        assert!(matches!(
            sse.drain_events(10),
            Err(TransportError::MessageTooLarge { .. })
        ));
    }
}
