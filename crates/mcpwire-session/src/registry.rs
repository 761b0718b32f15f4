//! The capability registry.
//!
//! Handlers are grouped by category: tools by name, resources by URI,
//! prompts by name, one sampling provider, and notification observers by
//! method. Registering a handler also declares the matching capability, in
//! the same `&mut` call, so the advertised capability set can never drift
//! from what is actually routable.
//!
//! Registering a second handler under an existing key is a configuration
//! error; the first registration stays in place.
//!
//! ```rust
//! use mcpwire_session::Registry;
//! use mcpwire_core::types::{Tool, ToolOutput};
//!
//! let mut registry = Registry::new();
//! registry
//!     .add_tool(Tool::new("echo"), |args, _ctx| async move {
//!         Ok(ToolOutput::text(args.to_string()))
//!     })
//!     .unwrap();
//!
//! assert!(registry.server_capabilities().has_tools());
//! assert!(registry.add_tool(Tool::new("echo"), |_, _| async { Ok(ToolOutput::text("")) }).is_err());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use mcpwire_core::capability::{
    ClientCapabilities, EmptyCapability, PromptCapability, ResourceCapability, ServerCapabilities,
    ToolCapability,
};
use mcpwire_core::error::McpError;
use mcpwire_core::methods;
use mcpwire_core::protocol::{Notification, Request};
use mcpwire_core::types::{
    CallToolRequest, CallToolResult, CreateMessageRequest, CreateMessageResult, GetPromptRequest,
    GetPromptResult, ListPromptsResult, ListResourcesResult, ListToolsResult, Prompt,
    ReadResourceRequest, ReadResourceResult, Resource, Tool, ToolOutput,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::RequestContext;

/// Handler for `tools/call` on one tool.
pub type ToolFn =
    Arc<dyn Fn(Value, RequestContext) -> BoxFuture<'static, Result<ToolOutput, McpError>> + Send + Sync>;

/// Handler for `resources/read` on one URI.
pub type ResourceFn = Arc<
    dyn Fn(String, RequestContext) -> BoxFuture<'static, Result<ReadResourceResult, McpError>>
        + Send
        + Sync,
>;

/// Handler for `prompts/get` on one prompt.
pub type PromptFn = Arc<
    dyn Fn(
            HashMap<String, String>,
            RequestContext,
        ) -> BoxFuture<'static, Result<GetPromptResult, McpError>>
        + Send
        + Sync,
>;

/// Handler for `sampling/createMessage`.
pub type SamplingFn = Arc<
    dyn Fn(
            CreateMessageRequest,
            RequestContext,
        ) -> BoxFuture<'static, Result<CreateMessageResult, McpError>>
        + Send
        + Sync,
>;

/// Observer for one notification method. Runs inline on the read loop.
pub type NotificationFn = Arc<dyn Fn(&Notification) + Send + Sync>;

/// A future produced by routing a request.
pub(crate) type RouteFuture = BoxFuture<'static, Result<Value, McpError>>;

struct RegisteredTool {
    tool: Tool,
    handler: ToolFn,
}

struct RegisteredResource {
    resource: Resource,
    handler: ResourceFn,
}

struct RegisteredPrompt {
    prompt: Prompt,
    handler: PromptFn,
}

/// Method and category to handler mapping, and the capability set it implies.
#[derive(Default)]
pub struct Registry {
    tools: BTreeMap<String, RegisteredTool>,
    resources: BTreeMap<String, RegisteredResource>,
    prompts: BTreeMap<String, RegisteredPrompt>,
    sampling: Option<SamplingFn>,
    observers: HashMap<String, Vec<NotificationFn>>,
    server_caps: ServerCapabilities,
    client_caps: ClientCapabilities,
    list_changed: bool,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    pub fn add_tool<F, Fut>(&mut self, tool: Tool, handler: F) -> Result<(), McpError>
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, McpError>> + Send + 'static,
    {
        if self.tools.contains_key(&tool.name) {
            return Err(McpError::configuration(format!(
                "tool '{}' is already registered",
                tool.name
            )));
        }
        let handler: ToolFn = Arc::new(move |args, ctx| handler(args, ctx).boxed());
        self.tools
            .insert(tool.name.clone(), RegisteredTool { tool, handler });
        self.server_caps
            .tools
            .get_or_insert_with(ToolCapability::default);
        self.apply_list_changed();
        Ok(())
    }

    /// Register a tool whose arguments deserialize into `A`.
    ///
    /// The input schema is derived from `A`. Arguments that do not match
    /// are answered with an `Invalid params` error before the handler runs.
    pub fn add_typed_tool<A, F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<(), McpError>
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(A, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, McpError>> + Send + 'static,
    {
        let tool = Tool::new(name)
            .description(description)
            .input_type::<A>();
        let handler = Arc::new(handler);
        self.add_tool(tool, move |args, ctx| {
            let handler = Arc::clone(&handler);
            async move {
                let args: A = serde_json::from_value(args)
                    .map_err(|e| McpError::invalid_params_from(methods::TOOLS_CALL, e))?;
                handler(args, ctx).await
            }
        })
    }

    /// Register a resource under its URI.
    pub fn add_resource<F, Fut>(&mut self, resource: Resource, handler: F) -> Result<(), McpError>
    where
        F: Fn(String, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ReadResourceResult, McpError>> + Send + 'static,
    {
        if self.resources.contains_key(&resource.uri) {
            return Err(McpError::configuration(format!(
                "resource '{}' is already registered",
                resource.uri
            )));
        }
        let handler: ResourceFn = Arc::new(move |uri, ctx| handler(uri, ctx).boxed());
        self.resources
            .insert(resource.uri.clone(), RegisteredResource { resource, handler });
        self.server_caps
            .resources
            .get_or_insert_with(ResourceCapability::default);
        self.apply_list_changed();
        Ok(())
    }

    /// Register a prompt.
    pub fn add_prompt<F, Fut>(&mut self, prompt: Prompt, handler: F) -> Result<(), McpError>
    where
        F: Fn(HashMap<String, String>, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetPromptResult, McpError>> + Send + 'static,
    {
        if self.prompts.contains_key(&prompt.name) {
            return Err(McpError::configuration(format!(
                "prompt '{}' is already registered",
                prompt.name
            )));
        }
        let handler: PromptFn = Arc::new(move |args, ctx| handler(args, ctx).boxed());
        self.prompts
            .insert(prompt.name.clone(), RegisteredPrompt { prompt, handler });
        self.server_caps
            .prompts
            .get_or_insert_with(PromptCapability::default);
        self.apply_list_changed();
        Ok(())
    }

    /// Register the sampling provider. There can be only one.
    pub fn set_sampling<F, Fut>(&mut self, handler: F) -> Result<(), McpError>
    where
        F: Fn(CreateMessageRequest, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CreateMessageResult, McpError>> + Send + 'static,
    {
        if self.sampling.is_some() {
            return Err(McpError::configuration(
                "a sampling handler is already registered",
            ));
        }
        self.sampling = Some(Arc::new(move |request, ctx| handler(request, ctx).boxed()));
        self.client_caps.sampling = Some(EmptyCapability {});
        Ok(())
    }

    /// Declare `listChanged` on every category that has, or later gets,
    /// handlers.
    pub fn advertise_list_changed(&mut self) {
        self.list_changed = true;
        self.apply_list_changed();
    }

    fn apply_list_changed(&mut self) {
        if !self.list_changed {
            return;
        }
        if let Some(tools) = &mut self.server_caps.tools {
            tools.list_changed = Some(true);
        }
        if let Some(resources) = &mut self.server_caps.resources {
            resources.list_changed = Some(true);
        }
        if let Some(prompts) = &mut self.server_caps.prompts {
            prompts.list_changed = Some(true);
        }
    }

    /// Observe notifications with the given method.
    ///
    /// Observers run on the read loop, in arrival order, and must not block.
    pub fn on_notification<F>(&mut self, method: impl Into<String>, observer: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.observers
            .entry(method.into())
            .or_default()
            .push(Arc::new(observer));
    }

    /// Capabilities a server with these handlers declares.
    #[must_use]
    pub const fn server_capabilities(&self) -> &ServerCapabilities {
        &self.server_caps
    }

    /// Capabilities a client with these handlers declares.
    #[must_use]
    pub const fn client_capabilities(&self) -> &ClientCapabilities {
        &self.client_caps
    }

    /// Whether a sampling provider is registered.
    #[must_use]
    pub const fn has_sampling(&self) -> bool {
        self.sampling.is_some()
    }

    /// Registered tool definitions, ordered by name.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.values().map(|r| r.tool.clone()).collect()
    }

    /// Registered resources, ordered by URI.
    #[must_use]
    pub fn resources(&self) -> Vec<Resource> {
        self.resources.values().map(|r| r.resource.clone()).collect()
    }

    /// Registered prompts, ordered by name.
    #[must_use]
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.values().map(|r| r.prompt.clone()).collect()
    }

    /// Methods this registry can answer.
    #[must_use]
    pub fn methods(&self) -> Vec<&'static str> {
        let mut routes = Vec::new();
        if !self.tools.is_empty() {
            routes.extend([methods::TOOLS_LIST, methods::TOOLS_CALL]);
        }
        if !self.resources.is_empty() {
            routes.extend([methods::RESOURCES_LIST, methods::RESOURCES_READ]);
        }
        if !self.prompts.is_empty() {
            routes.extend([methods::PROMPTS_LIST, methods::PROMPTS_GET]);
        }
        if self.sampling.is_some() {
            routes.push(methods::SAMPLING_CREATE_MESSAGE);
        }
        routes
    }

    /// Deliver a notification to its observers. Returns how many ran.
    pub(crate) fn observe(&self, notification: &Notification) -> usize {
        let Some(observers) = self.observers.get(notification.method()) else {
            return 0;
        };
        for observer in observers {
            observer(notification);
        }
        observers.len()
    }

    /// Find the handler for `request` and start it.
    ///
    /// Unknown methods, and methods whose category has no handlers, fail
    /// with `Method not found` without running anything.
    pub(crate) fn route(&self, request: &Request, ctx: RequestContext) -> Result<RouteFuture, McpError> {
        let method = request.method();
        let params = request.params.clone().unwrap_or(Value::Null);

        match method {
            methods::TOOLS_LIST if !self.tools.is_empty() => ready(&ListToolsResult {
                tools: self.tools(),
                next_cursor: None,
            }),
            methods::TOOLS_CALL if !self.tools.is_empty() => self.route_tool_call(params, ctx),
            methods::RESOURCES_LIST if !self.resources.is_empty() => ready(&ListResourcesResult {
                resources: self.resources(),
                next_cursor: None,
            }),
            methods::RESOURCES_READ if !self.resources.is_empty() => {
                let ReadResourceRequest { uri } = parse_params(method, params)?;
                let Some(registered) = self.resources.get(&uri) else {
                    return Err(McpError::resource_not_found(uri));
                };
                Ok(serialize_result((registered.handler)(uri, ctx)))
            }
            methods::PROMPTS_LIST if !self.prompts.is_empty() => ready(&ListPromptsResult {
                prompts: self.prompts(),
                next_cursor: None,
            }),
            methods::PROMPTS_GET if !self.prompts.is_empty() => {
                let GetPromptRequest { name, arguments } = parse_params(method, params)?;
                let Some(registered) = self.prompts.get(&name) else {
                    return Err(McpError::invalid_params(
                        method,
                        format!("Unknown prompt: {name}"),
                    ));
                };
                let missing = registered.prompt.missing_arguments(&arguments);
                if !missing.is_empty() {
                    return Err(McpError::invalid_params(
                        method,
                        format!("Missing required arguments: {}", missing.join(", ")),
                    ));
                }
                Ok(serialize_result((registered.handler)(arguments, ctx)))
            }
            methods::SAMPLING_CREATE_MESSAGE => match &self.sampling {
                Some(handler) => {
                    let request: CreateMessageRequest = parse_params(method, params)?;
                    Ok(serialize_result(handler(request, ctx)))
                }
                None => Err(self.not_found(method)),
            },
            _ => Err(self.not_found(method)),
        }
    }

    fn route_tool_call(&self, params: Value, ctx: RequestContext) -> Result<RouteFuture, McpError> {
        let CallToolRequest { name, arguments } = parse_params(methods::TOOLS_CALL, params)?;
        let Some(registered) = self.tools.get(&name) else {
            return Err(McpError::tool_not_found(
                name,
                self.tools.keys().cloned().collect(),
            ));
        };

        let arguments = arguments.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let call = (registered.handler)(arguments, ctx);
        Ok(async move {
            let result = match call.await {
                Ok(output) => CallToolResult::from(output),
                // Malformed arguments and cancellation stay protocol-level.
                Err(e @ (McpError::InvalidParams(_) | McpError::Cancelled { .. })) => return Err(e),
                Err(e) => {
                    tracing::debug!(tool = %name, error = %e, "tool failed");
                    CallToolResult::error(e.to_string())
                }
            };
            Ok(serde_json::to_value(result)?)
        }
        .boxed())
    }

    fn not_found(&self, method: &str) -> McpError {
        McpError::method_not_found_with_suggestions(
            method,
            self.methods().into_iter().map(str::to_string).collect(),
        )
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("prompts", &self.prompts.keys().collect::<Vec<_>>())
            .field("sampling", &self.sampling.is_some())
            .field("observers", &self.observers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, McpError> {
    serde_json::from_value(params).map_err(|e| McpError::invalid_params_from(method, e))
}

fn ready<T: Serialize>(value: &T) -> Result<RouteFuture, McpError> {
    let value = serde_json::to_value(value)?;
    Ok(futures::future::ready(Ok(value)).boxed())
}

fn serialize_result<T, Fut>(call: Fut) -> RouteFuture
where
    T: Serialize,
    Fut: Future<Output = Result<T, McpError>> + Send + 'static,
{
    async move { Ok(serde_json::to_value(call.await?)?) }.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn echo(registry: &mut Registry, name: &str) -> Result<(), McpError> {
        registry.add_tool(Tool::new(name), |args, _ctx| async move {
            Ok(ToolOutput::text(args.to_string()))
        })
    }

    #[test]
    fn test_empty_registry_declares_nothing() {
        let registry = Registry::new();
        assert_eq!(registry.server_capabilities(), &ServerCapabilities::default());
        assert_eq!(registry.client_capabilities(), &ClientCapabilities::default());
        assert!(registry.methods().is_empty());
    }

    #[test]
    fn test_tool_registration_declares_tools() -> Result<(), McpError> {
        let mut registry = Registry::new();
        echo(&mut registry, "echo")?;

        assert_eq!(
            serde_json::to_value(registry.server_capabilities())?,
            serde_json::json!({"tools": {}})
        );
        assert_eq!(registry.methods(), vec!["tools/list", "tools/call"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_tool_is_rejected() -> Result<(), McpError> {
        let mut registry = Registry::new();
        echo(&mut registry, "echo")?;

        let err = echo(&mut registry, "echo").unwrap_err();
        assert!(matches!(err, McpError::Configuration { .. }));
        assert_eq!(registry.tools().len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_resource_and_prompt_are_rejected() -> Result<(), McpError> {
        let mut registry = Registry::new();
        let read = |uri: String, _ctx| async move {
            Ok(ReadResourceResult {
                contents: vec![mcpwire_core::types::ResourceContents::text(uri, "hi")],
            })
        };
        registry.add_resource(Resource::new("file:///a", "a"), read)?;
        assert!(registry.add_resource(Resource::new("file:///a", "again"), read).is_err());

        let get = |_args, _ctx| async { Ok(GetPromptResult::user("hello")) };
        registry.add_prompt(Prompt::new("greet"), get)?;
        assert!(registry.add_prompt(Prompt::new("greet"), get).is_err());

        let caps = registry.server_capabilities();
        assert!(caps.has_resources());
        assert!(caps.has_prompts());
        assert!(!caps.has_tools());
        Ok(())
    }

    #[test]
    fn test_sampling_declares_client_capability_once() -> Result<(), McpError> {
        let mut registry = Registry::new();
        let handler = |_req, _ctx| async {
            Ok(CreateMessageResult::text(
                "model",
                "Paris",
                mcpwire_core::types::StopReason::EndTurn,
            ))
        };
        registry.set_sampling(handler)?;

        assert!(registry.client_capabilities().has_sampling());
        assert!(registry.has_sampling());
        assert!(registry.set_sampling(handler).is_err());
        assert_eq!(registry.methods(), vec!["sampling/createMessage"]);
        Ok(())
    }

    #[test]
    fn test_observers_run_by_method() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();
        let counter = Arc::clone(&seen);
        registry.on_notification(methods::TOOLS_LIST_CHANGED, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(
            registry.observe(&Notification::new(methods::TOOLS_LIST_CHANGED)),
            1
        );
        assert_eq!(registry.observe(&Notification::new(methods::PROGRESS)), 0);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_list_changed_applies_to_later_registrations() -> Result<(), McpError> {
        let mut registry = Registry::new();
        echo(&mut registry, "echo")?;
        registry.advertise_list_changed();
        registry.add_prompt(Prompt::new("greet"), |_args, _ctx| async {
            Ok(GetPromptResult::user("hello"))
        })?;

        assert_eq!(
            serde_json::to_value(registry.server_capabilities())?,
            serde_json::json!({
                "tools": {"listChanged": true},
                "prompts": {"listChanged": true}
            })
        );
        Ok(())
    }

    #[test]
    fn test_tools_are_listed_by_name() -> Result<(), McpError> {
        let mut registry = Registry::new();
        echo(&mut registry, "zeta")?;
        echo(&mut registry, "alpha")?;

        let names: Vec<_> = registry.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        Ok(())
    }
}
