//! # mcpwire-core
//!
//! Wire-level building blocks for the Model Context Protocol:
//!
//! - **Envelopes**: validated JSON-RPC 2.0 requests, responses and notifications
//! - **Codec**: frame decoding that keeps enough of a bad frame to attribute the failure
//! - **Capabilities**: the `initialize` handshake payloads and version negotiation
//! - **Payloads**: content, tools, resources, prompts, sampling
//! - **Errors**: [`McpError`], with JSON-RPC codes and `miette` diagnostics
//!
//! This crate has no async runtime dependency.
//!
//! ```rust
//! use mcpwire_core::codec;
//! use mcpwire_core::protocol::Message;
//!
//! let frame = r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"c","version":"1"}}}"#;
//! let message = codec::decode(frame).unwrap();
//! assert_eq!(message.method(), Some("initialize"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod capability;
pub mod codec;
pub mod error;
pub mod methods;
pub mod protocol;
pub mod types;

pub use capability::{
    ClientCapabilities, Implementation, InitializeRequest, InitializeResult, PROTOCOL_VERSION,
    SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ServerFeature, is_version_supported,
    negotiate_version,
};
pub use codec::{DecodeError, FrameKind};
pub use error::{JsonRpcError, McpError, McpResultExt};
pub use protocol::{Message, Notification, ProgressToken, Request, RequestId, Response};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capability::{
        ClientCapabilities, Implementation, ServerCapabilities, ServerFeature,
    };
    pub use crate::error::{McpError, McpResultExt};
    pub use crate::protocol::{Message, Notification, Request, RequestId, Response};
    pub use crate::types::{
        CallToolResult, Content, CreateMessageRequest, CreateMessageResult, GetPromptResult,
        ModelPreferences, Prompt, PromptMessage, ReadResourceResult, Resource, ResourceContents,
        Role, SamplingMessage, StopReason, Tool, ToolOutput,
    };
}
