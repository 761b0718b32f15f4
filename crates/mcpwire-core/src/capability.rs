//! Capabilities, peer info and the `initialize` handshake payloads.
//!
//! Capabilities are exchanged once, during `initialize`, and are fixed for
//! the rest of the session. A present (even empty) object means "supported":
//! `{"tools": {}}` declares tool support without change notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The latest protocol version this library speaks.
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Every protocol version this library accepts, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] =
    &["2025-11-25", "2025-06-18", "2025-03-26", "2024-11-05"];

/// Whether `version` is one of [`SUPPORTED_PROTOCOL_VERSIONS`].
#[must_use]
pub fn is_version_supported(version: &str) -> bool {
    SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
}

/// The server side of version negotiation.
///
/// A supported request is echoed back; anything else is answered with the
/// latest version, leaving the client to decide whether it can continue.
#[must_use]
pub fn negotiate_version(requested: &str) -> VersionNegotiation {
    if is_version_supported(requested) {
        VersionNegotiation::Accepted(requested.to_string())
    } else {
        VersionNegotiation::CounterOffer {
            requested: requested.to_string(),
            offered: PROTOCOL_VERSION.to_string(),
        }
    }
}

/// Outcome of [`negotiate_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionNegotiation {
    /// The requested version is used as-is.
    Accepted(String),
    /// The requested version is unsupported; another is offered.
    CounterOffer {
        /// What the client asked for.
        requested: String,
        /// What the server offers instead.
        offered: String,
    },
}

impl VersionNegotiation {
    /// The version to put in the `initialize` result.
    #[must_use]
    pub fn version(&self) -> &str {
        match self {
            Self::Accepted(v) => v,
            Self::CounterOffer { offered, .. } => offered,
        }
    }
}

/// Server capabilities advertised during initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapability>,
    /// Resource capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceCapability>,
    /// Prompt capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptCapability>,
    /// Logging capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<EmptyCapability>,
    /// Completion capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<EmptyCapability>,
    /// Experimental capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<serde_json::Value>,
}

impl ServerCapabilities {
    /// Create empty capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable tool support.
    #[must_use]
    pub fn with_tools(mut self) -> Self {
        self.tools = Some(ToolCapability::default());
        self
    }

    /// Enable resource support.
    #[must_use]
    pub fn with_resources(mut self) -> Self {
        self.resources = Some(ResourceCapability::default());
        self
    }

    /// Enable prompt support.
    #[must_use]
    pub fn with_prompts(mut self) -> Self {
        self.prompts = Some(PromptCapability::default());
        self
    }

    /// Enable logging support.
    #[must_use]
    pub fn with_logging(mut self) -> Self {
        self.logging = Some(EmptyCapability {});
        self
    }

    /// Whether a feature is declared.
    #[must_use]
    pub const fn supports(&self, feature: ServerFeature) -> bool {
        match feature {
            ServerFeature::Tools => self.tools.is_some(),
            ServerFeature::Resources => self.resources.is_some(),
            ServerFeature::Prompts => self.prompts.is_some(),
            ServerFeature::Logging => self.logging.is_some(),
        }
    }

    /// Check if tools are supported.
    #[must_use]
    pub const fn has_tools(&self) -> bool {
        self.tools.is_some()
    }

    /// Check if resources are supported.
    #[must_use]
    pub const fn has_resources(&self) -> bool {
        self.resources.is_some()
    }

    /// Check if prompts are supported.
    #[must_use]
    pub const fn has_prompts(&self) -> bool {
        self.prompts.is_some()
    }
}

/// A server feature a client can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerFeature {
    /// `tools/*`.
    Tools,
    /// `resources/*`.
    Resources,
    /// `prompts/*`.
    Prompts,
    /// `logging/*`.
    Logging,
}

impl fmt::Display for ServerFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tools => "tools",
            Self::Resources => "resources",
            Self::Prompts => "prompts",
            Self::Logging => "logging",
        })
    }
}

/// Client capabilities advertised during initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Roots capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
    /// The client can answer `sampling/createMessage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<EmptyCapability>,
    /// The client can answer elicitation requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<EmptyCapability>,
    /// Experimental capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<serde_json::Value>,
}

impl ClientCapabilities {
    /// Create empty capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare sampling support.
    #[must_use]
    pub fn with_sampling(mut self) -> Self {
        self.sampling = Some(EmptyCapability {});
        self
    }

    /// Declare roots support.
    #[must_use]
    pub fn with_roots(mut self) -> Self {
        self.roots = Some(RootsCapability::default());
        self
    }

    /// Check if sampling is supported.
    #[must_use]
    pub const fn has_sampling(&self) -> bool {
        self.sampling.is_some()
    }
}

/// Tool capability options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCapability {
    /// The server sends `notifications/tools/list_changed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Resource capability options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCapability {
    /// The server supports per-resource subscriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,
    /// The server sends `notifications/resources/list_changed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Prompt capability options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCapability {
    /// The server sends `notifications/prompts/list_changed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Roots capability options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsCapability {
    /// The client sends `notifications/roots/list_changed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// A capability with no options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyCapability {}

/// Name and version of one side of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Program name.
    pub name: String,
    /// Program version.
    pub version: String,
}

impl Implementation {
    /// Create implementation info.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Parameters of `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    /// Version the client wants to speak.
    pub protocol_version: String,
    /// What the client supports.
    pub capabilities: ClientCapabilities,
    /// Who the client is.
    pub client_info: Implementation,
}

/// Result of `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Version the server settled on.
    pub protocol_version: String,
    /// What the server supports.
    pub capabilities: ServerCapabilities,
    /// Who the server is.
    pub server_info: Implementation,
    /// Usage hints for the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_initialize_request_wire_shape() {
        let request = InitializeRequest {
            protocol_version: "2024-11-05".to_string(),
            capabilities: ClientCapabilities::new().with_sampling(),
            client_info: Implementation::new("test-client", "1.0.0"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {"sampling": {}},
                "clientInfo": {"name": "test-client", "version": "1.0.0"}
            })
        );
    }

    #[test]
    fn test_empty_object_declares_support() {
        let caps: ServerCapabilities = serde_json::from_value(json!({"tools": {}})).unwrap();
        assert!(caps.supports(ServerFeature::Tools));
        assert!(!caps.supports(ServerFeature::Prompts));
        assert_eq!(serde_json::to_value(&caps).unwrap(), json!({"tools": {}}));
    }

    #[test]
    fn test_version_negotiation() {
        assert_eq!(
            negotiate_version("2024-11-05"),
            VersionNegotiation::Accepted("2024-11-05".to_string())
        );
        let counter = negotiate_version("1999-01-01");
        assert_eq!(counter.version(), PROTOCOL_VERSION);
        assert!(!is_version_supported("1999-01-01"));
    }
}
