//! Client side of mcpwire.
//!
//! [`ClientBuilder`] configures and connects a [`Client`]; the connection
//! runs the `initialize` handshake before `connect` returns.
//!
//! # Example
//!
//! ```no_run
//! use mcpwire_client::ClientBuilder;
//! use mcpwire_transport::SpawnedTransport;
//!
//! # async fn example() -> Result<(), mcpwire_core::error::McpError> {
//! let transport = SpawnedTransport::spawn("my-mcp-server", &[] as &[&str]).await?;
//! let client = ClientBuilder::new()
//!     .name("my-client")
//!     .version("1.0.0")
//!     .connect(transport)
//!     .await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("{}", tool.name);
//! }
//! let result = client.call_tool("echo", serde_json::json!({"text": "hi"})).await?;
//! println!("{:?}", result.first_text());
//!
//! client.close().await;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod builder;
pub mod client;

pub use builder::ClientBuilder;
pub use client::Client;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::ClientBuilder;
    pub use crate::client::Client;
    pub use mcpwire_session::CallOptions;
}
