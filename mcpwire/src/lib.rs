//! # mcpwire
//!
//! The protocol core of a Model Context Protocol SDK: transports that move
//! JSON-RPC 2.0 messages, a codec that validates them, a session that
//! correlates requests with responses and routes incoming requests, and
//! thin server and client layers on top.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mcpwire::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), McpError> {
//!     mcpwire::logging::init(LogConfig::default())?;
//!
//!     ServerBuilder::new("calculator", "1.0.0")
//!         .tool(Tool::new("double"), |args, _ctx| async move {
//!             let n = args["n"].as_f64().unwrap_or_default();
//!             Ok(ToolOutput::text((n * 2.0).to_string()))
//!         })
//!         .build()?
//!         .run(StdioTransport::stdio())
//!         .await
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`mcpwire_core`] - Messages, codec, capabilities, errors (no async runtime)
//! - [`mcpwire_transport`] - stdio, spawned process, HTTP+SSE and in-memory transports
//! - [`mcpwire_session`] - Correlation, dispatch, lifecycle, capability registry
//! - [`mcpwire_server`] - `ServerBuilder` and the server handle
//! - [`mcpwire_client`] - `ClientBuilder` and the client handle

#![deny(missing_docs)]

pub mod logging;
pub mod prelude;

pub use mcpwire_core::*;

pub use mcpwire_client as client;
pub use mcpwire_server as server;
pub use mcpwire_session as session;
pub use mcpwire_transport as transport;

pub use mcpwire_client::{Client, ClientBuilder};
pub use mcpwire_server::{Server, ServerBuilder, ServerRuntime};
pub use mcpwire_session::{
    CallOptions, RequestContext, Role, Session, SessionConfig, SessionState,
};
pub use mcpwire_transport::{Transport, TransportError, TransportMetadata};

pub use logging::LogConfig;
