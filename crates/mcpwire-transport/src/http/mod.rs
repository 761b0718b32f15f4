//! Client side of the Streamable HTTP transport.
//!
//! - each message is POSTed with `Accept: application/json, text/event-stream`
//! - the server answers with a JSON body, an SSE stream, or `202 Accepted`
//! - `mcp-session-id` is captured from responses and echoed on later requests
//! - `404` on a request that carried a session id means the session expired
//! - closing sends `DELETE` to end the server-side session
//!
//! ```rust
//! use mcpwire_transport::http::HttpTransportConfig;
//! use std::time::Duration;
//!
//! let config = HttpTransportConfig::new("http://localhost:8080/mcp")
//!     .with_connect_timeout(Duration::from_secs(30))
//!     .with_request_timeout(Duration::from_secs(60));
//!
//! assert_eq!(config.base_url, "http://localhost:8080/mcp");
//! assert!(config.endpoint().is_ok());
//! ```

mod client;
mod config;
mod sse;

pub use client::HttpTransport;
pub use config::{
    DEFAULT_MAX_MESSAGE_SIZE, HttpTransportBuilder, HttpTransportConfig,
    MCP_PROTOCOL_VERSION_HEADER, MCP_SESSION_ID_HEADER,
};
pub use sse::SseBuffer;
