//! Prelude module for convenient imports.
//!
//! ```rust
//! use mcpwire::prelude::*;
//!
//! let caps = ServerCapabilities::new().with_tools();
//! assert!(caps.has_tools());
//! ```

pub use mcpwire_core::prelude::*;

pub use mcpwire_client::{Client, ClientBuilder};
pub use mcpwire_server::{Server, ServerBuilder, ServerRuntime};
pub use mcpwire_session::{CallOptions, CancellationToken, RequestContext, SessionConfig};
pub use mcpwire_transport::{MemoryTransport, StdioTransport, Transport};

#[cfg(feature = "http")]
pub use mcpwire_transport::{HttpTransport, HttpTransportConfig};

pub use mcpwire_transport::{SpawnedTransport, SpawnedTransportBuilder};

pub use crate::logging::LogConfig;
