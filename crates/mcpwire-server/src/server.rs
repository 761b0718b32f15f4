//! Running a server over a transport.
//!
//! A [`ServerRuntime`] is a fully configured server that is not attached to
//! anything yet. [`ServerRuntime::serve`] attaches it to one transport and
//! returns a [`Server`] handle for that connection; [`ServerRuntime::run`]
//! does the same and then waits until the client goes away, which is what a
//! stdio server's `main` wants.
//!
//! ```rust,no_run
//! use mcpwire_server::ServerBuilder;
//! use mcpwire_transport::StdioTransport;
//!
//! # async fn run() -> Result<(), mcpwire_core::error::McpError> {
//! ServerBuilder::new("my-server", "1.0.0")
//!     .build()?
//!     .run(StdioTransport::stdio())
//!     .await
//! # }
//! ```

use mcpwire_core::capability::{
    ClientCapabilities, Implementation, InitializeRequest, ServerCapabilities,
};
use mcpwire_core::error::McpError;
use mcpwire_core::methods;
use mcpwire_core::types::{CreateMessageRequest, CreateMessageResult, Prompt, Resource, Tool};
use mcpwire_session::{Registry, ServerIdentity, Session, SessionConfig, SessionState};
use mcpwire_transport::{Transport, TransportError};
use serde_json::Value;

/// A configured server waiting for a connection.
pub struct ServerRuntime {
    identity: ServerIdentity,
    registry: Registry,
    config: SessionConfig,
}

impl ServerRuntime {
    pub(crate) const fn new(
        identity: ServerIdentity,
        registry: Registry,
        config: SessionConfig,
    ) -> Self {
        Self {
            identity,
            registry,
            config,
        }
    }

    /// Name and version reported as `serverInfo`.
    #[must_use]
    pub const fn info(&self) -> &Implementation {
        &self.identity.info
    }

    /// Capabilities declared in the `initialize` result.
    #[must_use]
    pub const fn capabilities(&self) -> &ServerCapabilities {
        self.registry.server_capabilities()
    }

    /// Registered tools.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.registry.tools()
    }

    /// Registered resources.
    #[must_use]
    pub fn resources(&self) -> Vec<Resource> {
        self.registry.resources()
    }

    /// Registered prompts.
    #[must_use]
    pub fn prompts(&self) -> Vec<Prompt> {
        self.registry.prompts()
    }

    /// Attach to `transport` and start answering.
    ///
    /// Returns as soon as the connection is up; the client's `initialize` is
    /// answered in the background.
    pub fn serve<T>(self, transport: T) -> Result<Server, McpError>
    where
        T: Transport<Error = TransportError> + 'static,
    {
        let name = self.identity.info.name.clone();
        let session = Session::start(transport, self.identity, self.registry, self.config)?;
        tracing::info!(server = %name, "serving");
        Ok(Server { session })
    }

    /// Serve `transport` until the connection closes.
    pub async fn run<T>(self, transport: T) -> Result<(), McpError>
    where
        T: Transport<Error = TransportError> + 'static,
    {
        let server = self.serve(transport)?;
        server.closed().await;
        Ok(())
    }
}

impl std::fmt::Debug for ServerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRuntime")
            .field("info", &self.identity.info)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// A server attached to one client connection.
///
/// Cheap to clone. Dropping the handle does not close the connection; the
/// session runs until the client disconnects or [`close`](Self::close) is
/// called.
#[derive(Debug, Clone)]
pub struct Server {
    session: Session,
}

impl Server {
    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Whether the client has completed the handshake.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session.state() == SessionState::Ready
    }

    /// The client's `initialize` request, once it has arrived.
    #[must_use]
    pub fn client_request(&self) -> Option<&InitializeRequest> {
        self.session.initialize_request()
    }

    /// Capabilities the client declared, once it has initialized.
    #[must_use]
    pub fn client_capabilities(&self) -> Option<&ClientCapabilities> {
        self.client_request().map(|init| &init.capabilities)
    }

    /// The negotiated protocol version.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.session.protocol_version()
    }

    /// Ask the client's model for a completion.
    ///
    /// Fails with `CapabilityNotSupported` unless the client declared
    /// `sampling`.
    pub async fn create_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<CreateMessageResult, McpError> {
        self.session.create_message(request).await
    }

    /// Tell the client the tool list changed.
    pub async fn notify_tools_list_changed(&self) -> Result<(), McpError> {
        let declared = self
            .session
            .registry()
            .server_capabilities()
            .tools
            .as_ref()
            .and_then(|caps| caps.list_changed)
            .unwrap_or(false);
        self.notify_list_changed("tools", declared, methods::TOOLS_LIST_CHANGED)
            .await
    }

    /// Tell the client the resource list changed.
    pub async fn notify_resources_list_changed(&self) -> Result<(), McpError> {
        let declared = self
            .session
            .registry()
            .server_capabilities()
            .resources
            .as_ref()
            .and_then(|caps| caps.list_changed)
            .unwrap_or(false);
        self.notify_list_changed("resources", declared, methods::RESOURCES_LIST_CHANGED)
            .await
    }

    /// Tell the client the prompt list changed.
    pub async fn notify_prompts_list_changed(&self) -> Result<(), McpError> {
        let declared = self
            .session
            .registry()
            .server_capabilities()
            .prompts
            .as_ref()
            .and_then(|caps| caps.list_changed)
            .unwrap_or(false);
        self.notify_list_changed("prompts", declared, methods::PROMPTS_LIST_CHANGED)
            .await
    }

    /// Send an arbitrary notification to the client.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        self.session.notify(method, params).await
    }

    /// Wait until the connection closes.
    pub async fn closed(&self) {
        self.session.closed().await;
    }

    /// Close the connection.
    pub async fn close(&self) {
        self.session.close().await;
    }

    async fn notify_list_changed(
        &self,
        category: &str,
        declared: bool,
        method: &str,
    ) -> Result<(), McpError> {
        if !declared {
            return Err(McpError::capability_not_supported(format!(
                "{category}.listChanged"
            )));
        }
        self.session.notify(method, None).await
    }
}
