//! Context chaining for `Result<T, McpError>`.

use super::types::McpError;

/// Extension trait for attaching context to an [`McpError`].
///
/// The wrapped error keeps its JSON-RPC code and category; use
/// [`McpError::root`] to look through any number of context layers.
///
/// ```rust
/// use mcpwire_core::error::{McpError, McpResultExt};
///
/// fn read_config() -> Result<(), McpError> {
///     let result: Result<(), McpError> = Err(McpError::resource_not_found("file:///config"));
///     result.context("loading server configuration")?;
///     Ok(())
/// }
///
/// let err = read_config().unwrap_err();
/// assert!(matches!(err.root(), McpError::ResourceNotFound { .. }));
/// ```
pub trait McpResultExt<T> {
    /// Add context to an error.
    fn context<C: Into<String>>(self, context: C) -> Result<T, McpError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<C, F>(self, f: F) -> Result<T, McpError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> McpResultExt<T> for Result<T, McpError> {
    fn context<C: Into<String>>(self, context: C) -> Self {
        self.map_err(|e| e.wrap(context))
    }

    fn with_context<C, F>(self, f: F) -> Self
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.wrap(f()))
    }
}
