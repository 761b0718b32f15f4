//! MCP client implementation.
//!
//! A [`Client`] is a client-role [`Session`] that has completed the
//! handshake, plus typed methods for the server's features. Each method
//! checks the server's declared capabilities first and fails locally with
//! `CapabilityNotSupported` instead of sending a request the server
//! promised not to answer.

use std::collections::{HashMap, HashSet};

use mcpwire_core::capability::{Implementation, InitializeResult, ServerCapabilities};
use mcpwire_core::error::McpError;
use mcpwire_core::methods;
use mcpwire_core::types::{
    CallToolRequest, CallToolResult, GetPromptRequest, GetPromptResult, ListPromptsResult,
    ListResourcesResult, ListToolsResult, PaginatedRequest, Prompt, ReadResourceRequest,
    ReadResourceResult, Resource, ResourceContents, Tool,
};
use mcpwire_session::{CallOptions, Session};
use serde_json::Value;

/// An MCP client connected to a server.
///
/// - Tools: `list_tools()`, `call_tool()`
/// - Resources: `list_resources()`, `read_resource()`
/// - Prompts: `list_prompts()`, `get_prompt()`
///
/// Requests from the server (sampling) are answered by the handlers given
/// to the [`ClientBuilder`](crate::ClientBuilder). Dropping the client
/// starts closing the connection.
pub struct Client {
    session: Session,
}

impl Client {
    pub(crate) const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn init(&self) -> Result<&InitializeResult, McpError> {
        self.session
            .initialize_result()
            .ok_or_else(|| McpError::internal("client session has no initialize result"))
    }

    /// Server name and version.
    #[must_use]
    pub fn server_info(&self) -> Option<&Implementation> {
        self.session.initialize_result().map(|init| &init.server_info)
    }

    /// Capabilities the server declared.
    #[must_use]
    pub fn server_capabilities(&self) -> Option<&ServerCapabilities> {
        self.session
            .initialize_result()
            .map(|init| &init.capabilities)
    }

    /// Instructions the server sent with its `initialize` result.
    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.session
            .initialize_result()
            .and_then(|init| init.instructions.as_deref())
    }

    /// The negotiated protocol version.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.session.protocol_version()
    }

    /// Whether the connection is still usable.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.state().is_open()
    }

    // ==========================================================================
    // Tool Operations
    // ==========================================================================

    /// List all available tools, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let mut tools = Vec::new();
        let mut trail = CursorTrail::new(methods::TOOLS_LIST);
        let mut cursor = None;
        loop {
            let page = self.list_tools_page(cursor.take()).await?;
            tools.extend(page.tools);
            match trail.follow(page.next_cursor)? {
                Some(next) => cursor = Some(next),
                None => return Ok(tools),
            }
        }
    }

    /// Fetch one page of tools.
    pub async fn list_tools_page(&self, cursor: Option<String>) -> Result<ListToolsResult, McpError> {
        self.ensure_capability("tools", |caps| caps.has_tools())?;
        self.session
            .call(methods::TOOLS_LIST, &PaginatedRequest { cursor })
            .await
    }

    /// Call a tool by name.
    ///
    /// A tool that fails returns `Ok` with `is_error` set; `Err` means the
    /// call itself failed.
    pub async fn call_tool(
        &self,
        name: impl Into<String>,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        self.call_tool_with(name, arguments, CallOptions::default())
            .await
    }

    /// Call a tool with per-call cancellation or timeout.
    pub async fn call_tool_with(
        &self,
        name: impl Into<String>,
        arguments: Value,
        options: CallOptions,
    ) -> Result<CallToolResult, McpError> {
        self.ensure_capability("tools", |caps| caps.has_tools())?;

        let request = CallToolRequest {
            name: name.into(),
            arguments: Some(arguments),
        };
        let value = self
            .session
            .request_with(
                methods::TOOLS_CALL,
                Some(serde_json::to_value(request)?),
                options,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // ==========================================================================
    // Resource Operations
    // ==========================================================================

    /// List all available resources, following pagination cursors.
    pub async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        let mut resources = Vec::new();
        let mut trail = CursorTrail::new(methods::RESOURCES_LIST);
        let mut cursor = None;
        loop {
            let page = self.list_resources_page(cursor.take()).await?;
            resources.extend(page.resources);
            match trail.follow(page.next_cursor)? {
                Some(next) => cursor = Some(next),
                None => return Ok(resources),
            }
        }
    }

    /// Fetch one page of resources.
    pub async fn list_resources_page(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourcesResult, McpError> {
        self.ensure_capability("resources", |caps| caps.has_resources())?;
        self.session
            .call(methods::RESOURCES_LIST, &PaginatedRequest { cursor })
            .await
    }

    /// Read a resource by URI.
    pub async fn read_resource(
        &self,
        uri: impl Into<String>,
    ) -> Result<Vec<ResourceContents>, McpError> {
        self.ensure_capability("resources", |caps| caps.has_resources())?;

        let request = ReadResourceRequest { uri: uri.into() };
        let result: ReadResourceResult = self.session.call(methods::RESOURCES_READ, &request).await?;
        Ok(result.contents)
    }

    // ==========================================================================
    // Prompt Operations
    // ==========================================================================

    /// List all available prompts, following pagination cursors.
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        let mut prompts = Vec::new();
        let mut trail = CursorTrail::new(methods::PROMPTS_LIST);
        let mut cursor = None;
        loop {
            let page = self.list_prompts_page(cursor.take()).await?;
            prompts.extend(page.prompts);
            match trail.follow(page.next_cursor)? {
                Some(next) => cursor = Some(next),
                None => return Ok(prompts),
            }
        }
    }

    /// Fetch one page of prompts.
    pub async fn list_prompts_page(
        &self,
        cursor: Option<String>,
    ) -> Result<ListPromptsResult, McpError> {
        self.ensure_capability("prompts", |caps| caps.has_prompts())?;
        self.session
            .call(methods::PROMPTS_LIST, &PaginatedRequest { cursor })
            .await
    }

    /// Render a prompt with the given arguments.
    pub async fn get_prompt(
        &self,
        name: impl Into<String>,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, McpError> {
        self.ensure_capability("prompts", |caps| caps.has_prompts())?;

        let request = GetPromptRequest {
            name: name.into(),
            arguments,
        };
        self.session.call(methods::PROMPTS_GET, &request).await
    }

    // ==========================================================================
    // Connection
    // ==========================================================================

    /// Check that the server is responsive.
    pub async fn ping(&self) -> Result<(), McpError> {
        self.session.ping().await
    }

    /// Close the connection and wait for teardown.
    pub async fn close(self) {
        tracing::debug!("closing client connection");
        self.session.close().await;
    }

    fn ensure_capability(
        &self,
        name: &str,
        declared: impl FnOnce(&ServerCapabilities) -> bool,
    ) -> Result<(), McpError> {
        if declared(&self.init()?.capabilities) {
            Ok(())
        } else {
            Err(McpError::capability_not_supported(name))
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.session.shutdown();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server", &self.server_info().map(|info| &info.name))
            .field("session", &self.session)
            .finish()
    }
}

// Cursors one listing has already followed. A server that hands back a cursor
// twice would otherwise keep the listing going forever.
struct CursorTrail {
    method: &'static str,
    seen: HashSet<String>,
}

impl CursorTrail {
    fn new(method: &'static str) -> Self {
        Self {
            method,
            seen: HashSet::new(),
        }
    }

    fn follow(&mut self, next: Option<String>) -> Result<Option<String>, McpError> {
        match next {
            Some(cursor) if !self.seen.insert(cursor.clone()) => Err(McpError::internal(format!(
                "{} returned cursor {cursor:?} twice",
                self.method
            ))),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cursor_trail_stops_on_repeat() {
        let mut trail = CursorTrail::new(methods::TOOLS_LIST);
        assert_eq!(trail.follow(Some("a".into())).unwrap(), Some("a".to_string()));
        assert_eq!(trail.follow(Some("b".into())).unwrap(), Some("b".to_string()));
        let err = trail.follow(Some("a".into())).unwrap_err();
        assert!(err.to_string().contains("tools/list"), "{err}");
        assert_eq!(trail.follow(None).unwrap(), None);
    }
}
