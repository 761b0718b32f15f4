//! The `initialize` handshake, from both ends.
//!
//! The client sends `initialize`, checks the version and the features it
//! depends on, then sends `notifications/initialized`. The server answers
//! `initialize` itself: a supported version is echoed, anything else gets
//! the latest version back.

use mcpwire_core::capability::{
    Implementation, InitializeRequest, InitializeResult, PROTOCOL_VERSION, ServerFeature,
    VersionNegotiation, is_version_supported, negotiate_version,
};
use mcpwire_core::error::{HandshakeDetails, McpError};
use mcpwire_core::methods;
use mcpwire_core::protocol::Request;
use serde_json::Value;

use crate::session::Session;
use crate::state::{Role, SessionState};

/// Who we are when acting as a client.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Name and version sent as `clientInfo`.
    pub info: Implementation,
    /// Version requested in `initialize`.
    pub protocol_version: String,
    /// Server features the handshake insists on.
    pub required: Vec<ServerFeature>,
}

impl ClientIdentity {
    /// A client requesting the latest protocol version.
    #[must_use]
    pub fn new(info: Implementation) -> Self {
        Self {
            info,
            protocol_version: PROTOCOL_VERSION.to_string(),
            required: Vec::new(),
        }
    }

    /// Request a specific protocol version.
    #[must_use]
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
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
}

/// Who we are when acting as a server.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    /// Name and version sent as `serverInfo`.
    pub info: Implementation,
    /// Usage hints for the model, sent with the `initialize` result.
    pub instructions: Option<String>,
}

impl ServerIdentity {
    /// A server without instructions.
    #[must_use]
    pub const fn new(info: Implementation) -> Self {
        Self {
            info,
            instructions: None,
        }
    }

    /// Attach instructions.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// The handshake side a session plays, with the identity it presents.
#[derive(Debug, Clone)]
pub enum Identity {
    /// Sends `initialize`.
    Client(ClientIdentity),
    /// Answers `initialize`.
    Server(ServerIdentity),
}

impl Identity {
    /// Which end of the handshake this is.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Client(_) => Role::Client,
            Self::Server(_) => Role::Server,
        }
    }
}

impl From<ClientIdentity> for Identity {
    fn from(identity: ClientIdentity) -> Self {
        Self::Client(identity)
    }
}

impl From<ServerIdentity> for Identity {
    fn from(identity: ServerIdentity) -> Self {
        Self::Server(identity)
    }
}

fn failed(message: impl Into<String>, source: McpError) -> McpError {
    McpError::HandshakeFailed(Box::new(HandshakeDetails {
        message: message.into(),
        local_version: None,
        peer_version: None,
        source: Some(Box::new(source)),
    }))
}

/// Run the client side of the handshake on a freshly started session.
pub(crate) async fn initialize(
    session: &Session,
    identity: &ClientIdentity,
) -> Result<InitializeResult, McpError> {
    session.advance(SessionState::Initializing);

    let params = InitializeRequest {
        protocol_version: identity.protocol_version.clone(),
        capabilities: session.registry().client_capabilities().clone(),
        client_info: identity.info.clone(),
    };
    let value = session
        .request(methods::INITIALIZE, Some(serde_json::to_value(&params)?))
        .await
        .map_err(|e| failed("initialize request failed", e))?;
    let result: InitializeResult = serde_json::from_value(value)
        .map_err(|e| failed("malformed initialize result", e.into()))?;

    if !is_version_supported(&result.protocol_version) {
        return Err(McpError::handshake_failed_with_versions(
            format!(
                "server answered with unsupported protocol version {}",
                result.protocol_version
            ),
            Some(identity.protocol_version.clone()),
            Some(result.protocol_version),
        ));
    }
    if let Some(missing) = identity
        .required
        .iter()
        .find(|feature| !result.capabilities.supports(**feature))
    {
        return Err(McpError::handshake_failed(format!(
            "server does not declare required feature '{missing}'"
        )));
    }

    session
        .notify(methods::INITIALIZED, None)
        .await
        .map_err(|e| failed("could not send initialized notification", e))?;

    tracing::info!(
        server = %result.server_info.name,
        version = %result.protocol_version,
        "session initialized"
    );
    session.record_initialize_result(result.clone());
    session.advance(SessionState::Ready);
    Ok(result)
}

/// Answer an inbound `initialize` on the server side.
pub(crate) fn answer_initialize(
    session: &Session,
    identity: &ServerIdentity,
    request: &Request,
) -> Result<Value, McpError> {
    if session.state() != SessionState::Uninitialized {
        return Err(McpError::invalid_request("Session already initialized"));
    }

    let params: InitializeRequest = serde_json::from_value(
        request.params.clone().unwrap_or(Value::Null),
    )
    .map_err(|e| McpError::invalid_params_from(methods::INITIALIZE, e))?;

    let negotiation = negotiate_version(&params.protocol_version);
    if let VersionNegotiation::CounterOffer { requested, offered } = &negotiation {
        tracing::warn!(%requested, %offered, "client requested an unsupported protocol version");
    }

    let result = InitializeResult {
        protocol_version: negotiation.version().to_string(),
        capabilities: session.registry().server_capabilities().clone(),
        server_info: identity.info.clone(),
        instructions: identity.instructions.clone(),
    };
    let value = serde_json::to_value(&result)?;

    tracing::info!(
        client = %params.client_info.name,
        version = %result.protocol_version,
        "client initialized"
    );
    session.record_initialize_request(params, result.protocol_version);
    session.advance(SessionState::Ready);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_client_identity_defaults_to_latest() {
        let identity = ClientIdentity::new(Implementation::new("c", "1"))
            .require(ServerFeature::Tools)
            .require(ServerFeature::Tools);
        assert_eq!(identity.protocol_version, PROTOCOL_VERSION);
        assert_eq!(identity.required, vec![ServerFeature::Tools]);
    }

    #[test]
    fn test_identity_roles() {
        let client: Identity = ClientIdentity::new(Implementation::new("c", "1")).into();
        let server: Identity = ServerIdentity::new(Implementation::new("s", "1")).into();
        assert_eq!(client.role(), Role::Client);
        assert_eq!(server.role(), Role::Server);
    }
}
