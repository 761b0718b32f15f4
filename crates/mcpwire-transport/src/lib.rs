//! Transports for mcpwire.
//!
//! A transport moves whole JSON-RPC [`Message`](mcpwire_core::Message)s
//! between two peers. Everything above it (correlation, routing,
//! lifecycle) lives in `mcpwire-session` and is identical for every
//! transport.
//!
//! | Transport | Use Case | Feature Flag |
//! |-----------|----------|--------------|
//! | [`StdioTransport`] | NDJSON over any reader/writer; `stdio()` for servers | Always available |
//! | [`SpawnedTransport`] | Launch a server as a child process | `tokio-runtime` |
//! | [`http::HttpTransport`] | Streamable HTTP client (POST + SSE) | `http` |
//! | [`MemoryTransport`] | In-process pair, no serialization | Always available |
//!
//! # Failure semantics
//!
//! `recv` returning `Ok(None)` is an orderly end of stream. A
//! [`TransportError::Decode`] reports one bad frame and leaves the transport
//! usable; every other error ends the connection.
//!
//! # Example
//!
//! ```no_run
//! use mcpwire_transport::{SpawnedTransport, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mcpwire_transport::TransportError> {
//!     let transport = SpawnedTransport::spawn("my-mcp-server", &[] as &[&str]).await?;
//!
//!     while let Some(msg) = transport.recv().await? {
//!         println!("{:?}", msg.method());
//!     }
//!
//!     transport.close().await?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod runtime;
pub mod stdio;
pub mod traits;

#[cfg(feature = "tokio-runtime")]
pub mod spawn;

#[cfg(feature = "http")]
pub mod http;

pub use error::TransportError;
pub use memory::MemoryTransport;
pub use stdio::StdioTransport;
pub use traits::{Transport, TransportMetadata};

#[cfg(feature = "tokio-runtime")]
pub use spawn::{SpawnedTransport, SpawnedTransportBuilder};

#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportBuilder, HttpTransportConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::TransportError;
    pub use crate::memory::MemoryTransport;
    pub use crate::stdio::StdioTransport;
    pub use crate::traits::{Transport, TransportMetadata};

    #[cfg(feature = "tokio-runtime")]
    pub use crate::spawn::{SpawnedTransport, SpawnedTransportBuilder};

    #[cfg(feature = "http")]
    pub use crate::http::{HttpTransport, HttpTransportConfig};
}
