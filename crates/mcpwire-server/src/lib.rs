//! Server side of mcpwire.
//!
//! Build a server with [`ServerBuilder`], registering tools, resources and
//! prompts as plain async closures, then attach it to a transport. The
//! capabilities sent in the `initialize` result are exactly the categories
//! that have handlers.
//!
//! # Example
//!
//! ```rust,no_run
//! use mcpwire_server::ServerBuilder;
//! use mcpwire_core::types::{CreateMessageRequest, Tool, ToolOutput};
//! use mcpwire_transport::StdioTransport;
//!
//! # async fn run() -> Result<(), mcpwire_core::error::McpError> {
//! let server = ServerBuilder::new("capitals", "1.0.0")
//!     .tool(Tool::new("ask"), |_args, ctx| async move {
//!         // Tool handlers can call back into the client's model.
//!         let reply = ctx
//!             .create_message(CreateMessageRequest::simple("What is the capital of France?", 64))
//!             .await?;
//!         Ok(ToolOutput::text(reply.as_text().unwrap_or_default()))
//!     })
//!     .serve(StdioTransport::stdio())?;
//!
//! server.closed().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Handlers
//!
//! Every handler receives a [`RequestContext`](mcpwire_session::RequestContext)
//! with the request id, a cancellation token, the caller's progress token
//! and a handle to the client. A tool that returns `Err` produces a tool
//! result with `isError: true`; argument errors and cancellation stay
//! protocol errors.

#![deny(missing_docs)]

pub mod builder;
pub mod server;

pub use builder::ServerBuilder;
pub use server::{Server, ServerRuntime};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::ServerBuilder;
    pub use crate::server::{Server, ServerRuntime};
    pub use mcpwire_session::RequestContext;
}
