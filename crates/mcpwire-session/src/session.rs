//! The session: one connection's lifecycle, correlation and routing.
//!
//! A [`Session`] owns two background tasks per connection:
//!
//! - the **writer**, the only task that calls `Transport::send`. Everything
//!   outbound goes through one bounded queue, so messages leave in the order
//!   they were queued.
//! - the **reader**, which classifies each inbound message. Responses
//!   resolve pending calls, notifications are handled inline in arrival
//!   order, and every request gets a task of its own. The reader never waits
//!   for a handler.
//!
//! Both roles use the same machinery; they differ only in the registry they
//! route to and in which side of the handshake they play.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use mcpwire_core::capability::{InitializeRequest, InitializeResult};
use mcpwire_core::codec::{DecodeError, FrameKind};
use mcpwire_core::error::{JsonRpcError, McpError};
use mcpwire_core::methods;
use mcpwire_core::protocol::{Message, Notification, Request, RequestId, Response};
use mcpwire_core::types::{CancelledNotification, CreateMessageRequest, CreateMessageResult};
use mcpwire_transport::{Transport, TransportError, TransportMetadata};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::SessionConfig;
use crate::context::RequestContext;
use crate::handshake::{self, ClientIdentity, Identity, ServerIdentity};
use crate::pending::{CallOutcome, PendingCalls};
use crate::registry::Registry;
use crate::state::{Role, SessionState};

/// How long teardown waits for queued messages to be flushed.
const WRITER_DRAIN: Duration = Duration::from_secs(1);

/// Per-call overrides for [`Session::request_with`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Abandon the call when this token fires.
    pub cancel: Option<CancellationToken>,
    /// Abandon the call after this long. Overrides the session default.
    pub timeout: Option<Duration>,
}

impl CallOptions {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the call when `token` is cancelled.
    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Abandon the call after `timeout`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct Inner {
    identity: Identity,
    registry: Registry,
    config: SessionConfig,
    metadata: TransportMetadata,
    outbound: mpsc::Sender<Message>,
    pending: PendingCalls,
    next_id: AtomicI64,
    state: watch::Sender<SessionState>,
    close_reason: Mutex<Option<String>>,
    // Parent of every inbound handler's token.
    shutdown: CancellationToken,
    inbound: Mutex<HashMap<RequestId, CancellationToken>>,
    limiter: Arc<Semaphore>,
    initialize_result: OnceLock<InitializeResult>,
    initialize_request: OnceLock<InitializeRequest>,
    protocol_version: OnceLock<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn close_reason(&self) -> String {
        lock(&self.close_reason)
            .clone()
            .unwrap_or_else(|| "session closed".to_string())
    }

    fn closed_error(&self) -> McpError {
        McpError::connection_closed(self.close_reason())
    }

    fn advance(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if next > *current {
                tracing::debug!(from = %*current, to = %next, "session state");
                *current = next;
                true
            } else {
                false
            }
        });
    }

    fn begin_close(&self, reason: impl Into<String>) {
        {
            let mut slot = lock(&self.close_reason);
            if slot.is_none() {
                *slot = Some(reason.into());
            }
        }
        self.advance(SessionState::Closing);
        self.shutdown.cancel();
    }
}

/// One MCP connection, usable from either side.
///
/// `Session` is a cheap handle; clones share the connection. The connection
/// stays up until [`close`](Self::close) is called, the peer hangs up, or
/// the transport fails.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    /// Attach a session to `transport` and start its reader and writer.
    ///
    /// A server session answers `initialize` when it arrives; a client
    /// session should use [`connect`](Self::connect) instead, which also
    /// runs the handshake. Must be called inside a Tokio runtime.
    ///
    /// Fails if the registry has a sampling handler but the transport
    /// cannot carry requests from the server.
    pub fn start<T>(
        transport: T,
        identity: impl Into<Identity>,
        registry: Registry,
        config: SessionConfig,
    ) -> Result<Self, McpError>
    where
        T: Transport<Error = TransportError> + 'static,
    {
        let identity = identity.into();
        let metadata = transport.metadata();
        if registry.has_sampling() && !metadata.bidirectional {
            return Err(McpError::configuration(format!(
                "the {} transport cannot carry server-initiated requests, so it cannot host a sampling handler",
                metadata.transport_type
            )));
        }

        let role = identity.role();
        let (outbound, outbound_rx) = mpsc::channel(config.outbound_capacity.max(1));
        let (state, _) = watch::channel(SessionState::Uninitialized);
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));

        let inner = Arc::new(Inner {
            identity,
            registry,
            config,
            metadata,
            outbound,
            pending: PendingCalls::new(),
            next_id: AtomicI64::new(0),
            state,
            close_reason: Mutex::new(None),
            shutdown: CancellationToken::new(),
            inbound: Mutex::new(HashMap::new()),
            limiter,
            initialize_result: OnceLock::new(),
            initialize_request: OnceLock::new(),
            protocol_version: OnceLock::new(),
        });

        let span = tracing::debug_span!(
            "mcp_session",
            %role,
            transport = %inner.metadata.transport_type
        );
        let transport = Arc::new(transport);
        let writer = tokio::spawn(
            run_writer(Arc::clone(&inner), Arc::clone(&transport), outbound_rx)
                .instrument(span.clone()),
        );

        let session = Self { inner };
        tokio::spawn(session.clone().run_reader(transport, writer).instrument(span));
        tracing::debug!(%role, "session started");
        Ok(session)
    }

    /// Start a client session and run the `initialize` handshake.
    ///
    /// On failure the session is closed and the error is returned, usually
    /// as [`McpError::HandshakeFailed`].
    pub async fn connect<T>(
        transport: T,
        identity: ClientIdentity,
        registry: Registry,
        config: SessionConfig,
    ) -> Result<Self, McpError>
    where
        T: Transport<Error = TransportError> + 'static,
    {
        let session = Self::start(transport, identity.clone(), registry, config)?;
        match handshake::initialize(&session, &identity).await {
            Ok(_) => Ok(session),
            Err(e) => {
                tracing::warn!(error = %e, "handshake failed");
                session.inner.begin_close(format!("handshake failed: {e}"));
                session.closed().await;
                Err(e)
            }
        }
    }

    /// Which side of the handshake this session plays.
    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.identity.role()
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Watch lifecycle changes.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Whether the session has finished tearing down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// Metadata of the underlying transport.
    #[must_use]
    pub fn transport_metadata(&self) -> &TransportMetadata {
        &self.inner.metadata
    }

    /// The handlers this session routes to.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The server's `initialize` answer (client sessions, after the handshake).
    #[must_use]
    pub fn initialize_result(&self) -> Option<&InitializeResult> {
        self.inner.initialize_result.get()
    }

    /// The client's `initialize` request (server sessions, after the handshake).
    #[must_use]
    pub fn initialize_request(&self) -> Option<&InitializeRequest> {
        self.inner.initialize_request.get()
    }

    /// The protocol version both sides settled on.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.inner.protocol_version.get().map(String::as_str)
    }

    /// Number of outbound calls awaiting a response.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    /// Send a request and wait for its result.
    ///
    /// Uses the session's default timeout, if one is configured.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        self.request_with(method, params, CallOptions::default())
            .await
    }

    /// Send a request with per-call cancellation and timeout.
    ///
    /// The call resolves exactly once: with the peer's answer, with
    /// `Cancelled` or `Timeout` when abandoned locally, or with
    /// `ConnectionClosed` when the session goes away first. An abandoned
    /// call sends `notifications/cancelled` to the peer, best effort.
    pub async fn request_with(
        &self,
        method: &str,
        params: Option<Value>,
        options: CallOptions,
    ) -> Result<Value, McpError> {
        if !self.state().is_open() {
            return Err(self.inner.closed_error());
        }

        let id = RequestId::Number(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut rx = self.inner.pending.insert(id.clone(), method)?;

        let request = match params {
            Some(params) => Request::with_params(method.to_string(), id.clone(), params),
            None => Request::new(method.to_string(), id.clone()),
        };
        tracing::debug!(%id, method, "sending request");
        if let Err(e) = self.enqueue(Message::Request(request)).await {
            self.inner.pending.remove(&id);
            return Err(e);
        }

        let timeout = options.timeout.or(self.inner.config.request_timeout);
        let deadline = async move {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        let cancel = options.cancel.unwrap_or_default();

        let (abandoned, reason) = tokio::select! {
            biased;
            outcome = &mut rx => return settle(outcome),
            () = cancel.cancelled() => (
                McpError::cancelled_with_reason(method, "cancelled by caller"),
                "cancelled by caller",
            ),
            () = deadline => (
                McpError::timeout(method, timeout.unwrap_or_default()),
                "timed out",
            ),
        };

        if !self.inner.pending.remove(&id) {
            // Another outcome removed the entry first and is delivering it.
            return settle(rx.await);
        }
        tracing::debug!(%id, method, reason, "abandoning request");
        self.send_cancelled(id, reason);
        Err(abandoned)
    }

    /// Send a request with typed parameters and result.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, McpError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        let value = self.request(method, Some(params)).await?;
        decode_result(method, value)
    }

    /// Send a notification.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        if !self.state().is_open() {
            return Err(self.inner.closed_error());
        }
        let notification = match params {
            Some(params) => Notification::with_params(method.to_string(), params),
            None => Notification::new(method.to_string()),
        };
        self.enqueue(Message::Notification(notification)).await
    }

    /// Check that the peer is responsive.
    pub async fn ping(&self) -> Result<(), McpError> {
        self.request(methods::PING, None).await.map(|_| ())
    }

    /// Ask the client's model for a completion.
    ///
    /// Fails locally with `CapabilityNotSupported`, without sending
    /// anything, unless the client declared `sampling` during the handshake.
    pub async fn create_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<CreateMessageResult, McpError> {
        let declared = self
            .initialize_request()
            .is_some_and(|init| init.capabilities.has_sampling());
        if !declared {
            return Err(McpError::capability_not_supported("sampling"));
        }
        self.call(methods::SAMPLING_CREATE_MESSAGE, &request).await
    }

    /// Close the session and wait for teardown to finish.
    ///
    /// Pending calls fail with `ConnectionClosed` and running handlers are
    /// cancelled. Closing twice is harmless.
    pub async fn close(&self) {
        self.shutdown();
        self.closed().await;
    }

    /// Start closing without waiting for teardown.
    pub fn shutdown(&self) {
        self.inner.begin_close("session closed");
    }

    /// Wait until the session has closed, for whatever reason.
    pub async fn closed(&self) {
        let mut changes = self.inner.state.subscribe();
        let _ = changes
            .wait_for(|state| *state == SessionState::Closed)
            .await;
    }

    pub(crate) fn advance(&self, next: SessionState) {
        self.inner.advance(next);
    }

    pub(crate) fn record_initialize_result(&self, result: InitializeResult) {
        let _ = self
            .inner
            .protocol_version
            .set(result.protocol_version.clone());
        let _ = self.inner.initialize_result.set(result);
    }

    pub(crate) fn record_initialize_request(&self, request: InitializeRequest, version: String) {
        let _ = self.inner.protocol_version.set(version);
        let _ = self.inner.initialize_request.set(request);
    }

    async fn enqueue(&self, message: Message) -> Result<(), McpError> {
        self.inner
            .outbound
            .send(message)
            .await
            .map_err(|_| self.inner.closed_error())
    }

    fn send_cancelled(&self, request_id: RequestId, reason: &str) {
        let params = CancelledNotification {
            request_id,
            reason: Some(reason.to_string()),
        };
        let Ok(params) = serde_json::to_value(params) else {
            return;
        };
        let notification = Notification::with_params(methods::CANCELLED, params);
        // Never wait here: the caller has already given up.
        if let Err(e) = self
            .inner
            .outbound
            .try_send(Message::Notification(notification))
        {
            tracing::debug!(error = %e, "could not send cancellation notice");
        }
    }

    async fn respond(&self, id: RequestId, outcome: CallOutcome) {
        let response = match outcome {
            Ok(result) => Response::success(id, result),
            Err(e) => {
                tracing::debug!(%id, error = %e, "answering with error");
                Response::error(id, JsonRpcError::from(&e))
            }
        };
        if self.enqueue(Message::Response(response)).await.is_err() {
            tracing::debug!("session closed before the response could be queued");
        }
    }

    // =========================================================================
    // Read side
    // =========================================================================

    async fn run_reader<T>(self, transport: Arc<T>, mut writer: JoinHandle<()>)
    where
        T: Transport<Error = TransportError> + 'static,
    {
        let shutdown = self.inner.shutdown.clone();
        let reason = loop {
            let frame = tokio::select! {
                biased;
                () = shutdown.cancelled() => break None,
                frame = transport.recv() => frame,
            };
            let step = async {
                match frame {
                    Ok(Some(message)) => {
                        self.dispatch(message).await;
                        None
                    }
                    Ok(None) => Some("peer closed the connection".to_string()),
                    Err(TransportError::Decode(err)) => self.on_decode_error(err).await,
                    Err(e @ TransportError::RequestFailed { .. }) => {
                        self.on_exchange_failed(e);
                        None
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "transport failed");
                        Some(format!("transport error: {e}"))
                    }
                }
            };
            let stop = tokio::select! {
                biased;
                () = shutdown.cancelled() => break None,
                stop = step => stop,
            };
            if stop.is_some() {
                break stop;
            }
        };

        self.inner
            .begin_close(reason.unwrap_or_else(|| "session closed".to_string()));
        let reason = self.inner.close_reason();
        let failed = self.inner.pending.close_all(&reason);
        lock(&self.inner.inbound).clear();

        if tokio::time::timeout(WRITER_DRAIN, &mut writer).await.is_err() {
            tracing::debug!("writer did not drain in time");
            writer.abort();
        }
        if let Err(e) = transport.close().await {
            tracing::debug!(error = %e, "transport close failed");
        }
        self.inner.advance(SessionState::Closed);
        tracing::info!(%reason, failed_calls = failed, "session closed");
    }

    async fn dispatch(&self, message: Message) {
        match message {
            Message::Response(response) => self.on_response(response),
            Message::Notification(notification) => self.on_notification(&notification),
            Message::Request(request) => self.on_request(request).await,
        }
    }

    // One exchange failed on the transport; only its own call is affected.
    fn on_exchange_failed(&self, err: TransportError) {
        match err.request_id().cloned() {
            Some(id) => {
                tracing::warn!(%id, error = %err, "request failed in transport");
                if !self.inner.pending.resolve(&id, Err(err.into())) {
                    tracing::debug!(%id, "failed exchange has no pending call");
                }
            }
            None => tracing::warn!(error = %err, "message was not delivered"),
        }
    }

    fn on_response(&self, response: Response) {
        let id = response.id.clone();
        let outcome = response.into_result().map_err(McpError::remote);
        if !self.inner.pending.resolve(&id, outcome) {
            tracing::warn!(%id, "dropping response with no pending call");
        }
    }

    fn on_notification(&self, notification: &Notification) {
        match notification.method() {
            methods::CANCELLED => self.on_cancelled(notification),
            methods::INITIALIZED => tracing::debug!("peer finished initialization"),
            method => tracing::trace!(method, "notification"),
        }
        self.inner.registry.observe(notification);
    }

    fn on_cancelled(&self, notification: &Notification) {
        let params = notification.params.clone().unwrap_or(Value::Null);
        let cancelled: CancelledNotification = match serde_json::from_value(params) {
            Ok(cancelled) => cancelled,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed cancellation");
                return;
            }
        };
        match lock(&self.inner.inbound).get(&cancelled.request_id) {
            Some(token) => {
                tracing::debug!(
                    id = %cancelled.request_id,
                    reason = cancelled.reason.as_deref().unwrap_or(""),
                    "peer cancelled request"
                );
                token.cancel();
            }
            None => tracing::trace!(id = %cancelled.request_id, "cancellation for finished request"),
        }
    }

    async fn on_request(&self, request: Request) {
        let id = request.id.clone();
        tracing::debug!(%id, method = request.method(), "request");

        if let Identity::Server(identity) = &self.inner.identity {
            if let Some(outcome) = self.server_gate(identity, &request) {
                self.respond(id, outcome).await;
                return;
            }
        }
        if request.method() == methods::PING {
            self.respond(id, Ok(serde_json::json!({}))).await;
            return;
        }

        let cancel = self.inner.shutdown.child_token();
        let duplicate = {
            let mut inbound = lock(&self.inner.inbound);
            if inbound.contains_key(&id) {
                true
            } else {
                inbound.insert(id.clone(), cancel.clone());
                false
            }
        };
        if duplicate {
            self.respond(
                id,
                Err(McpError::invalid_request("request id is already in use")),
            )
            .await;
            return;
        }
        tokio::spawn(
            self.clone()
                .run_handler(request, cancel)
                .in_current_span(),
        );
    }

    // Requests a server answers itself, or refuses, before routing.
    fn server_gate(&self, identity: &ServerIdentity, request: &Request) -> Option<CallOutcome> {
        match request.method() {
            methods::INITIALIZE => Some(handshake::answer_initialize(self, identity, request)),
            methods::PING => None,
            _ if self.state() != SessionState::Ready => {
                Some(Err(McpError::invalid_request("Server not initialized")))
            }
            _ => None,
        }
    }

    async fn run_handler(self, request: Request, cancel: CancellationToken) {
        let id = request.id.clone();
        let method = request.method().to_string();

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            outcome = self.invoke(request, cancel.clone()) => Some(outcome),
        };
        lock(&self.inner.inbound).remove(&id);

        match outcome {
            Some(outcome) if !cancel.is_cancelled() => self.respond(id, outcome).await,
            _ => tracing::debug!(%id, %method, "handler cancelled, no response sent"),
        }
    }

    async fn invoke(&self, request: Request, cancel: CancellationToken) -> CallOutcome {
        let _permit = Arc::clone(&self.inner.limiter)
            .acquire_owned()
            .await
            .map_err(|_| self.inner.closed_error())?;

        let ctx = RequestContext::new(
            request.id.clone(),
            request.progress_token(),
            cancel,
            self.clone(),
        );
        let call = async { self.inner.registry.route(&request, ctx)?.await };
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(id = %request.id, method = request.method(), %message, "handler panicked");
                Err(McpError::internal(format!("handler panicked: {message}")))
            }
        }
    }

    // Returns the reason to close when the failure cannot be pinned on one call.
    async fn on_decode_error(&self, err: DecodeError) -> Option<String> {
        match (err.kind, err.id.clone()) {
            (FrameKind::Response, Some(id)) => {
                tracing::warn!(error = %err, "malformed response");
                if !self.inner.pending.resolve(&id, Err(McpError::from(err))) {
                    tracing::warn!(%id, "dropping malformed response with no pending call");
                }
                None
            }
            (FrameKind::Request, Some(id)) => {
                tracing::warn!(error = %err, "malformed request");
                self.respond(id, Err(McpError::invalid_request(err.message)))
                    .await;
                None
            }
            _ => {
                tracing::warn!(error = %err, "unattributable protocol error");
                Some(format!("protocol error: {err}"))
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role())
            .field("state", &self.state())
            .field("transport", &self.inner.metadata.transport_type)
            .field("pending", &self.inner.pending)
            .finish_non_exhaustive()
    }
}

fn settle(outcome: Result<CallOutcome, oneshot::Canceled>) -> CallOutcome {
    outcome.unwrap_or_else(|_| Err(McpError::connection_closed("pending call dropped")))
}

fn decode_result<R: DeserializeOwned>(method: &str, value: Value) -> Result<R, McpError> {
    serde_json::from_value(value)
        .map_err(|e| McpError::parse_with_source(format!("malformed {method} result"), e))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

// =============================================================================
// Write side
// =============================================================================

async fn run_writer<T>(inner: Arc<Inner>, transport: Arc<T>, mut rx: mpsc::Receiver<Message>)
where
    T: Transport<Error = TransportError> + 'static,
{
    loop {
        let message = tokio::select! {
            biased;
            message = rx.recv() => message,
            () = inner.shutdown.cancelled() => break,
        };
        let Some(message) = message else { break };
        if let Err(reason) = write_one(&inner, transport.as_ref(), message).await {
            inner.begin_close(reason);
            return;
        }
    }

    // Flush what was queued before the close began.
    rx.close();
    while let Some(message) = rx.recv().await {
        if let Err(e) = transport.send(message).await {
            tracing::debug!(error = %e, "dropping queued messages after close");
            break;
        }
    }
}

// Errors that only concern one message are absorbed; anything else ends the
// connection.
async fn write_one<T>(inner: &Inner, transport: &T, message: Message) -> Result<(), String>
where
    T: Transport<Error = TransportError>,
{
    let request_id = match &message {
        Message::Request(request) => Some(request.id.clone()),
        _ => None,
    };
    tracing::trace!(method = ?message.method(), id = ?message.id(), "writing");

    match transport.send(message).await {
        Ok(()) => Ok(()),
        Err(
            e @ (TransportError::MessageTooLarge { .. }
            | TransportError::Json(_)
            | TransportError::RequestFailed { .. }),
        ) => {
            tracing::warn!(error = %e, "dropping unsendable message");
            if let Some(id) = request_id {
                inner.pending.resolve(&id, Err(e.into()));
            }
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "write failed");
            let reason = format!("transport error: {e}");
            if let Some(id) = request_id {
                inner.pending.resolve(&id, Err(e.into()));
            }
            Err(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(boxed.as_ref()), "owned boom");

        let boxed: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_call_options_builder() {
        let token = CancellationToken::new();
        let options = CallOptions::new()
            .cancel_on(token)
            .timeout(Duration::from_millis(10));
        assert!(options.cancel.is_some());
        assert_eq!(options.timeout, Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_dropped_pending_call_settles_as_closed() {
        let err = settle(Err(oneshot::Canceled)).unwrap_err();
        assert!(err.is_connection_closed());
    }
}
