//! The MCP session layer.
//!
//! A [`Session`] turns a [`Transport`](mcpwire_transport::Transport) into a
//! full MCP connection. The same type serves both ends; the
//! [`Identity`] it is started with decides which side of the handshake it
//! plays, and its [`Registry`] decides what it can answer.
//!
//! - **Correlation**: outbound requests get fresh ids and resolve exactly
//!   once, with the peer's answer, a local cancel or timeout, or
//!   `ConnectionClosed`.
//! - **Routing**: inbound requests run concurrently, each with a
//!   [`RequestContext`]; notifications are handled in arrival order.
//! - **Capabilities**: a server declares exactly what its registry holds.
//!
//! # Example
//!
//! ```rust,no_run
//! use mcpwire_core::capability::Implementation;
//! use mcpwire_core::types::{Tool, ToolOutput};
//! use mcpwire_session::{ClientIdentity, Registry, ServerIdentity, Session, SessionConfig};
//! use mcpwire_transport::MemoryTransport;
//!
//! # async fn demo() -> Result<(), mcpwire_core::error::McpError> {
//! let (client_end, server_end) = MemoryTransport::pair();
//!
//! let mut tools = Registry::new();
//! tools.add_tool(Tool::new("echo"), |args, _ctx| async move {
//!     Ok(ToolOutput::text(args.to_string()))
//! })?;
//! let _server = Session::start(
//!     server_end,
//!     ServerIdentity::new(Implementation::new("demo", "1.0.0")),
//!     tools,
//!     SessionConfig::default(),
//! )?;
//!
//! let client = Session::connect(
//!     client_end,
//!     ClientIdentity::new(Implementation::new("demo-client", "1.0.0")),
//!     Registry::new(),
//!     SessionConfig::default(),
//! )
//! .await?;
//! client.ping().await?;
//! client.close().await;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod context;
pub mod handshake;
pub mod pending;
pub mod registry;
pub mod session;
pub mod state;

pub use config::SessionConfig;
pub use context::RequestContext;
pub use handshake::{ClientIdentity, Identity, ServerIdentity};
pub use pending::PendingCalls;
pub use registry::Registry;
pub use session::{CallOptions, Session};
pub use state::{Role, SessionState};

/// Token used to cancel calls and observe cancellation in handlers.
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::context::RequestContext;
    pub use crate::handshake::{ClientIdentity, ServerIdentity};
    pub use crate::registry::Registry;
    pub use crate::session::{CallOptions, Session};
    pub use crate::state::SessionState;
}
