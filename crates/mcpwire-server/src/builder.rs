//! Fluent builder for MCP servers.
//!
//! Handlers are registered on the builder one at a time; each registration
//! also declares the capability it needs. A registration that fails (a
//! duplicate tool name, a second resource with the same URI) does not panic:
//! the first failure is kept and reported by [`ServerBuilder::build`].
//!
//! # Example
//!
//! ```rust
//! use mcpwire_server::ServerBuilder;
//! use mcpwire_core::types::{Tool, ToolOutput};
//!
//! let server = ServerBuilder::new("calculator", "1.0.0")
//!     .instructions("Adds numbers.")
//!     .tool(Tool::new("add"), |args, _ctx| async move {
//!         let a = args["a"].as_f64().unwrap_or(0.0);
//!         let b = args["b"].as_f64().unwrap_or(0.0);
//!         Ok(ToolOutput::text((a + b).to_string()))
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert!(server.capabilities().has_tools());
//! assert_eq!(server.info().name, "calculator");
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use mcpwire_core::capability::Implementation;
use mcpwire_core::error::McpError;
use mcpwire_core::protocol::Notification;
use mcpwire_core::types::{
    GetPromptResult, Prompt, ReadResourceResult, Resource, Tool, ToolOutput,
};
use mcpwire_session::{Registry, RequestContext, ServerIdentity, SessionConfig};
use mcpwire_transport::{Transport, TransportError};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::server::{Server, ServerRuntime};

/// Builder for an MCP server.
pub struct ServerBuilder {
    identity: ServerIdentity,
    registry: Registry,
    config: SessionConfig,
    error: Option<McpError>,
}

impl ServerBuilder {
    /// Start a server with the given name and version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            identity: ServerIdentity::new(Implementation::new(name, version)),
            registry: Registry::new(),
            config: SessionConfig::default(),
            error: None,
        }
    }

    /// Usage hints returned to the client with the `initialize` result.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.identity = self.identity.instructions(instructions);
        self
    }

    /// Replace the session configuration.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Default timeout for requests this server sends, such as sampling.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_request_timeout(timeout);
        self
    }

    /// Declare `listChanged` for the registered categories, so the
    /// `notify_*_list_changed` methods on [`Server`] are allowed.
    #[must_use]
    pub fn list_changed(mut self) -> Self {
        self.registry.advertise_list_changed();
        self
    }

    /// Register a tool.
    #[must_use]
    pub fn tool<F, Fut>(mut self, tool: Tool, handler: F) -> Self
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, McpError>> + Send + 'static,
    {
        let outcome = self.registry.add_tool(tool, handler);
        self.keep_first_error(outcome);
        self
    }

    /// Register a tool with typed arguments; its input schema comes from `A`.
    #[must_use]
    pub fn typed_tool<A, F, Fut>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(A, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, McpError>> + Send + 'static,
    {
        let outcome = self.registry.add_typed_tool(name, description, handler);
        self.keep_first_error(outcome);
        self
    }

    /// Register a resource.
    #[must_use]
    pub fn resource<F, Fut>(mut self, resource: Resource, handler: F) -> Self
    where
        F: Fn(String, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ReadResourceResult, McpError>> + Send + 'static,
    {
        let outcome = self.registry.add_resource(resource, handler);
        self.keep_first_error(outcome);
        self
    }

    /// Register a prompt.
    #[must_use]
    pub fn prompt<F, Fut>(mut self, prompt: Prompt, handler: F) -> Self
    where
        F: Fn(HashMap<String, String>, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetPromptResult, McpError>> + Send + 'static,
    {
        let outcome = self.registry.add_prompt(prompt, handler);
        self.keep_first_error(outcome);
        self
    }

    /// Observe notifications from the client.
    #[must_use]
    pub fn on_notification<F>(mut self, method: impl Into<String>, observer: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.registry.on_notification(method, observer);
        self
    }

    /// Finish configuration.
    ///
    /// Fails with the first registration error, if any.
    pub fn build(self) -> Result<ServerRuntime, McpError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(ServerRuntime::new(self.identity, self.registry, self.config))
    }

    /// Build and start serving on `transport`.
    pub fn serve<T>(self, transport: T) -> Result<Server, McpError>
    where
        T: Transport<Error = TransportError> + 'static,
    {
        self.build()?.serve(transport)
    }

    fn keep_first_error(&mut self, outcome: Result<(), McpError>) {
        if let Err(err) = outcome {
            tracing::debug!(error = %err, "registration rejected");
            self.error.get_or_insert(err);
        }
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("identity", &self.identity)
            .field("registry", &self.registry)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpwire_core::types::ResourceContents;
    use pretty_assertions::assert_eq;

    fn noop(_args: Value, _ctx: RequestContext) -> impl Future<Output = Result<ToolOutput, McpError>> {
        async { Ok(ToolOutput::text("ok")) }
    }

    #[test]
    fn test_capabilities_follow_registrations() {
        let server = ServerBuilder::new("s", "1")
            .tool(Tool::new("a"), noop)
            .resource(Resource::new("mem://x", "x"), |uri, _ctx| async move {
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(uri, "x")],
                })
            })
            .build()
            .unwrap();

        let caps = server.capabilities();
        assert!(caps.has_tools());
        assert!(caps.has_resources());
        assert!(!caps.has_prompts());
    }

    #[test]
    fn test_first_registration_error_is_reported() {
        let err = ServerBuilder::new("s", "1")
            .tool(Tool::new("a"), noop)
            .tool(Tool::new("a"), noop)
            .tool(Tool::new("b"), noop)
            .build()
            .unwrap_err();

        assert!(matches!(err, McpError::Configuration { .. }));
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_typed_tool_publishes_schema() {
        #[derive(serde::Deserialize, JsonSchema)]
        struct Args {
            city: String,
        }

        let server = ServerBuilder::new("s", "1")
            .typed_tool("weather", "Current weather", |args: Args, _ctx| async move {
                Ok(ToolOutput::text(args.city))
            })
            .build()
            .unwrap();

        let tools = server.tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].input_schema["properties"]["city"]["type"], "string");
    }
}
