//! Method names used on the wire.

/// Handshake request, client to server.
pub const INITIALIZE: &str = "initialize";
/// Handshake completion, client to server.
pub const INITIALIZED: &str = "notifications/initialized";
/// Liveness check, either direction.
pub const PING: &str = "ping";

/// List tools.
pub const TOOLS_LIST: &str = "tools/list";
/// Call a tool.
pub const TOOLS_CALL: &str = "tools/call";
/// List resources.
pub const RESOURCES_LIST: &str = "resources/list";
/// Read a resource.
pub const RESOURCES_READ: &str = "resources/read";
/// List prompts.
pub const PROMPTS_LIST: &str = "prompts/list";
/// Render a prompt.
pub const PROMPTS_GET: &str = "prompts/get";

/// Ask the client's model for a completion, server to client.
pub const SAMPLING_CREATE_MESSAGE: &str = "sampling/createMessage";

/// A request was abandoned by its sender.
pub const CANCELLED: &str = "notifications/cancelled";
/// Progress on a long-running request.
pub const PROGRESS: &str = "notifications/progress";
/// The server's tool list changed.
pub const TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
/// The server's resource list changed.
pub const RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
/// The server's prompt list changed.
pub const PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";
