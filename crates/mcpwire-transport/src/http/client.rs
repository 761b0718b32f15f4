//! HTTP transport client implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::StreamExt;
use futures::channel::mpsc;
use mcpwire_core::codec;
use mcpwire_core::protocol::{Message, RequestId};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use url::Url;

use crate::error::TransportError;
use crate::runtime::AsyncMutex;
use crate::traits::{Transport, TransportMetadata};

use super::config::{
    HttpTransportBuilder, HttpTransportConfig, MCP_PROTOCOL_VERSION_HEADER, MCP_SESSION_ID_HEADER,
};
use super::sse::SseBuffer;

type Inbound = Result<Message, TransportError>;

// State shared with the tasks that own in-flight POSTs.
struct Shared {
    endpoint: Url,
    session_id: AsyncMutex<Option<String>>,
    last_event_id: AsyncMutex<Option<String>>,
    messages_received: AtomicU64,
    inbox: mpsc::UnboundedSender<Inbound>,
    max_message_size: usize,
}

impl Shared {
    fn deliver(&self, frame: &str) {
        let item = codec::decode(frame).map_err(TransportError::from);
        if item.is_ok() {
            self.messages_received.fetch_add(1, Ordering::Relaxed);
        }
        self.push(item);
    }

    fn push(&self, item: Inbound) {
        if self.inbox.unbounded_send(item).is_err() {
            tracing::debug!("dropping inbound item received after close");
        }
    }

    /// Handle the HTTP response, which may be JSON or SSE.
    ///
    /// Failures that belong to this exchange alone come back as
    /// [`TransportError::RequestFailed`] tagged with `request_id`.
    async fn handle_response(
        self: &Arc<Self>,
        response: Response,
        sent_session: Option<String>,
        request_id: Option<RequestId>,
    ) -> Result<(), TransportError> {
        let status = response.status();

        if let Some(sid) = response
            .headers()
            .get(MCP_SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            let mut session_id = self.session_id.lock().await;
            if session_id.as_deref() != Some(sid) {
                tracing::debug!(session_id = sid, "server assigned session");
                *session_id = Some(sid.to_string());
            }
        }

        match status {
            StatusCode::OK => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/json");

                if content_type.starts_with("text/event-stream") {
                    tokio::spawn(pump_sse(response, Arc::clone(self), request_id));
                    Ok(())
                } else {
                    self.process_json_response(response, request_id).await
                }
            }
            StatusCode::ACCEPTED => Ok(()),
            StatusCode::NOT_FOUND => match sent_session {
                Some(session_id) => {
                    *self.session_id.lock().await = None;
                    Err(TransportError::SessionExpired { session_id })
                }
                None => Err(TransportError::connection(format!(
                    "No MCP endpoint at {}",
                    self.endpoint
                ))),
            },
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(TransportError::request_failed(
                    request_id,
                    Some(status.as_u16()),
                    format!("Unexpected status code: {status}: {body}"),
                ))
            }
        }
    }

    async fn process_json_response(
        &self,
        response: Response,
        request_id: Option<RequestId>,
    ) -> Result<(), TransportError> {
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Err(TransportError::request_failed(
                    request_id,
                    Some(status),
                    format!("Failed to read response body: {e}"),
                ));
            }
        };

        let body = body.trim();
        if body.is_empty() {
            return Ok(());
        }
        if body.len() > self.max_message_size {
            return Err(TransportError::request_failed(
                request_id,
                Some(status),
                format!(
                    "Reply of {} bytes exceeds the {} byte limit",
                    body.len(),
                    self.max_message_size
                ),
            ));
        }

        self.deliver(body);
        Ok(())
    }
}

// Owns one request POST from dispatch until its reply has been delivered.
async fn exchange(
    shared: Arc<Shared>,
    post: RequestBuilder,
    sent_session: Option<String>,
    request_id: RequestId,
) {
    let outcome = match post.send().await {
        Ok(response) => {
            shared
                .handle_response(response, sent_session, Some(request_id.clone()))
                .await
        }
        Err(e) => Err(post_error(&e, Some(request_id.clone()))),
    };
    if let Err(e) = outcome {
        tracing::debug!(id = %request_id, error = %e, "HTTP exchange failed");
        shared.push(Err(e));
    }
}

// Refused connections end the transport. Anything else, timeouts included,
// only fails the exchange it happened on.
fn post_error(e: &reqwest::Error, request_id: Option<RequestId>) -> TransportError {
    if e.is_connect() {
        TransportError::connection(format!("HTTP POST failed: {e}"))
    } else {
        TransportError::request_failed(request_id, None, format!("HTTP POST failed: {e}"))
    }
}

/// Client side of the Streamable HTTP transport.
///
/// Every outgoing message is POSTed to the endpoint. The reply is a JSON
/// body, an SSE stream of messages, or `202 Accepted` with no body; either
/// way the messages surface through [`Transport::recv`] in arrival order.
///
/// Sending a request returns once the POST is dispatched. A failed exchange,
/// such as a 5xx status or a timed out reply, surfaces through `recv` as
/// [`TransportError::RequestFailed`] for that request id and leaves the
/// transport open. An expired session or a refused connection is terminal.
///
/// The server cannot send this client requests that expect a reply, so the
/// transport reports itself as not bidirectional.
pub struct HttpTransport {
    config: HttpTransportConfig,
    endpoint: Url,
    client: Client,
    shared: Arc<Shared>,
    inbox: AsyncMutex<mpsc::UnboundedReceiver<Inbound>>,
    connected: AtomicBool,
    messages_sent: AtomicU64,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    ///
    /// Nothing is sent until the first message.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::connection(format!("Failed to create HTTP client: {e}")))?;

        let (tx, rx) = mpsc::unbounded();
        let shared = Arc::new(Shared {
            endpoint: endpoint.clone(),
            session_id: AsyncMutex::new(config.session_id.clone()),
            last_event_id: AsyncMutex::new(None),
            messages_received: AtomicU64::new(0),
            inbox: tx,
            max_message_size: config.max_message_size,
        });

        Ok(Self {
            config,
            endpoint,
            client,
            shared,
            inbox: AsyncMutex::new(rx),
            connected: AtomicBool::new(true),
            messages_sent: AtomicU64::new(0),
        })
    }

    /// Create a transport for `base_url` with default settings.
    pub fn connect(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(HttpTransportConfig::new(base_url))
    }

    /// Get the current session ID, if any.
    pub async fn session_id(&self) -> Option<String> {
        self.shared.session_id.lock().await.clone()
    }

    /// Get the number of messages sent.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Get the number of messages received.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.shared.messages_received.load(Ordering::Relaxed)
    }

    /// Get the last event ID for SSE resumption.
    pub async fn last_event_id(&self) -> Option<String> {
        self.shared.last_event_id.lock().await.clone()
    }

    fn build_headers(&self, session_id: Option<&str>) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        headers.insert(
            MCP_PROTOCOL_VERSION_HEADER,
            HeaderValue::from_str(&self.config.protocol_version).map_err(|e| {
                TransportError::connection(format!("Invalid protocol version header: {e}"))
            })?,
        );

        if let Some(sid) = session_id {
            headers.insert(
                MCP_SESSION_ID_HEADER,
                HeaderValue::from_str(sid).map_err(|e| {
                    TransportError::connection(format!("Invalid session ID header: {e}"))
                })?,
            );
        }

        for (name, value) in &self.config.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    TransportError::connection(format!("Invalid header name '{name}': {e}"))
                })?,
                HeaderValue::from_str(value).map_err(|e| {
                    TransportError::connection(format!("Invalid header value for '{name}': {e}"))
                })?,
            );
        }

        Ok(headers)
    }
}

async fn pump_sse(response: Response, shared: Arc<Shared>, request_id: Option<RequestId>) {
    let mut stream = response.bytes_stream();
    let mut sse = SseBuffer::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                shared.push(Err(TransportError::request_failed(
                    request_id,
                    None,
                    format!("SSE stream error: {e}"),
                )));
                return;
            }
        };

        sse.push(&chunk);
        match sse.drain_events(shared.max_message_size) {
            Ok(events) => {
                for event in &events {
                    shared.deliver(event);
                }
            }
            Err(e) => {
                shared.push(Err(TransportError::request_failed(
                    request_id,
                    None,
                    e.to_string(),
                )));
                return;
            }
        }
        if let Some(id) = sse.last_event_id() {
            *shared.last_event_id.lock().await = Some(id.to_string());
        }
    }
    tracing::trace!("SSE response stream finished");
}

impl Transport for HttpTransport {
    type Error = TransportError;

    async fn send(&self, msg: Message) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let body = codec::encode(&msg)?;
        if body.len() > self.config.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: body.len(),
                max: self.config.max_message_size,
            });
        }

        let session_id = self.shared.session_id.lock().await.clone();
        let headers = self.build_headers(session_id.as_deref())?;
        let post = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .timeout(self.config.request_timeout)
            .body(body);
        self.messages_sent.fetch_add(1, Ordering::Relaxed);

        match msg {
            // The reply to a request arrives on its own task, so a slow
            // reply never holds up the messages sent after it.
            Message::Request(request) => {
                tokio::spawn(exchange(
                    Arc::clone(&self.shared),
                    post,
                    session_id,
                    request.id,
                ));
                Ok(())
            }
            // Notifications and responses are answered with 202 at once.
            // Awaiting them keeps them ahead of any later request.
            Message::Notification(_) | Message::Response(_) => {
                let response = post.send().await.map_err(|e| post_error(&e, None))?;
                self.shared.handle_response(response, session_id, None).await
            }
        }
    }

    async fn recv(&self) -> Result<Option<Message>, Self::Error> {
        let mut inbox = self.inbox.lock().await;
        match inbox.next().await {
            Some(item) => item.map(Some),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.shared.inbox.close_channel();

        let session_id = self.shared.session_id.lock().await.clone();
        if let Some(sid) = session_id {
            let headers = self.build_headers(Some(&sid))?;
            match self
                .client
                .delete(self.endpoint.clone())
                .headers(headers)
                .send()
                .await
            {
                Ok(response) => {
                    tracing::debug!(status = %response.status(), "terminated HTTP session");
                }
                Err(e) => tracing::debug!(error = %e, "session DELETE failed"),
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn metadata(&self) -> TransportMetadata {
        TransportMetadata::new("http")
            .remote_addr(self.endpoint.as_str())
            .bidirectional(false)
    }
}

impl HttpTransportBuilder {
    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport, TransportError> {
        HttpTransport::new(self.config)
    }
}
