//! Client builder for fluent construction.
//!
//! The [`ClientBuilder`] collects the client's identity, the server features
//! it depends on, and the handlers for requests the server may send back.
//! Capabilities are derived from the handlers: registering a sampling
//! handler declares `sampling`.

use std::future::Future;
use std::time::Duration;

use mcpwire_core::capability::{Implementation, ServerFeature};
use mcpwire_core::error::McpError;
use mcpwire_core::protocol::Notification;
use mcpwire_core::types::{CreateMessageRequest, CreateMessageResult};
use mcpwire_session::{ClientIdentity, Registry, RequestContext, Session, SessionConfig};
use mcpwire_transport::{Transport, TransportError};

use crate::client::Client;

/// Builder for constructing MCP clients.
///
/// # Example
///
/// ```no_run
/// use mcpwire_client::ClientBuilder;
/// use mcpwire_core::capability::ServerFeature;
/// use mcpwire_core::types::{CreateMessageResult, StopReason};
/// use mcpwire_transport::SpawnedTransport;
///
/// # async fn example() -> Result<(), mcpwire_core::error::McpError> {
/// let transport = SpawnedTransport::spawn("my-server", &[] as &[&str]).await?;
/// let client = ClientBuilder::new()
///     .name("my-client")
///     .version("1.0.0")
///     .require(ServerFeature::Tools)
///     .sampling_handler(|_request, _ctx| async {
///         Ok(CreateMessageResult::text("local", "Paris", StopReason::EndTurn))
///     })
///     .connect(transport)
///     .await?;
///
/// let tools = client.list_tools().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    name: String,
    version: String,
    protocol_version: Option<String>,
    required: Vec<ServerFeature>,
    sampling_declared: bool,
    registry: Registry,
    config: SessionConfig,
    error: Option<McpError>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new client builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "mcpwire-client".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: None,
            required: Vec::new(),
            sampling_declared: false,
            registry: Registry::new(),
            config: SessionConfig::default(),
            error: None,
        }
    }

    /// Set the client name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the client version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Request a specific protocol version instead of the latest.
    #[must_use]
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    /// Fail the handshake unless the server declares `feature`.
    #[must_use]
    pub fn require(mut self, feature: ServerFeature) -> Self {
        if !self.required.contains(&feature) {
            self.required.push(feature);
        }
        self
    }

    /// Declare the `sampling` capability.
    ///
    /// A declaration needs a handler behind it: connecting without a
    /// [`sampling_handler`](Self::sampling_handler) fails.
    #[must_use]
    pub fn with_sampling(mut self) -> Self {
        self.sampling_declared = true;
        self
    }

    /// Answer the server's `sampling/createMessage` requests.
    ///
    /// Declares the `sampling` capability.
    #[must_use]
    pub fn sampling_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CreateMessageRequest, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CreateMessageResult, McpError>> + Send + 'static,
    {
        if let Err(err) = self.registry.set_sampling(handler) {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Observe notifications from the server, such as
    /// `notifications/tools/list_changed` or `notifications/progress`.
    #[must_use]
    pub fn on_notification<F>(mut self, method: impl Into<String>, observer: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.registry.on_notification(method, observer);
        self
    }

    /// Replace the session configuration.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Default timeout for every request the client sends.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_request_timeout(timeout);
        self
    }

    /// Connect over `transport` and run the handshake.
    ///
    /// Fails before touching the transport if the configuration is
    /// inconsistent, and with `HandshakeFailed` if the server's answer is
    /// unacceptable.
    pub async fn connect<T>(self, transport: T) -> Result<Client, McpError>
    where
        T: Transport<Error = TransportError> + 'static,
    {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.sampling_declared && !self.registry.has_sampling() {
            return Err(McpError::configuration(
                "sampling is declared but no sampling handler is registered",
            ));
        }

        let mut identity = ClientIdentity::new(Implementation::new(self.name, self.version));
        if let Some(version) = self.protocol_version {
            identity = identity.protocol_version(version);
        }
        for feature in self.required {
            identity = identity.require(feature);
        }

        let session = Session::connect(transport, identity, self.registry, self.config).await?;
        Ok(Client::new(session))
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("protocol_version", &self.protocol_version)
            .field("required", &self.required)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpwire_core::types::StopReason;
    use mcpwire_transport::MemoryTransport;

    fn answer(
        _request: CreateMessageRequest,
        _ctx: RequestContext,
    ) -> impl Future<Output = Result<CreateMessageResult, McpError>> {
        async { Ok(CreateMessageResult::text("m", "ok", StopReason::EndTurn)) }
    }

    #[tokio::test]
    async fn test_declared_sampling_needs_handler() {
        let (transport, _peer) = MemoryTransport::pair();
        let err = ClientBuilder::new()
            .with_sampling()
            .connect(transport)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_second_sampling_handler_is_rejected() {
        let (transport, _peer) = MemoryTransport::pair();
        let err = ClientBuilder::new()
            .sampling_handler(answer)
            .sampling_handler(answer)
            .connect(transport)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Configuration { .. }));
    }

    #[test]
    fn test_require_deduplicates() {
        let builder = ClientBuilder::new()
            .require(ServerFeature::Tools)
            .require(ServerFeature::Tools);
        assert_eq!(builder.required, vec![ServerFeature::Tools]);
    }
}
