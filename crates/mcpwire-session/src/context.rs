//! Request context for inbound handlers.
//!
//! Every handler invocation gets a [`RequestContext`]: the id of the request
//! it is answering, a cancellation token that fires when the peer sends
//! `notifications/cancelled` or the session closes, the progress token the
//! caller attached, and a handle to the peer for calls back across the same
//! connection.
//!
//! ```rust,no_run
//! use mcpwire_session::RequestContext;
//! use mcpwire_core::error::McpError;
//!
//! async fn long_job(ctx: RequestContext) -> Result<(), McpError> {
//!     for step in 0..10u32 {
//!         if ctx.is_cancelled() {
//!             return Err(McpError::cancelled("long_job"));
//!         }
//!         ctx.progress(f64::from(step), Some(10.0), Some("working")).await?;
//!     }
//!     Ok(())
//! }
//! ```

use mcpwire_core::error::McpError;
use mcpwire_core::methods;
use mcpwire_core::protocol::{ProgressToken, RequestId};
use mcpwire_core::types::{CreateMessageRequest, CreateMessageResult, ProgressNotification};
use tokio_util::sync::CancellationToken;

use crate::session::Session;

/// Per-invocation state handed to handlers.
///
/// Cheap to clone; clones share the cancellation token.
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    progress_token: Option<ProgressToken>,
    cancel: CancellationToken,
    peer: Session,
}

impl RequestContext {
    pub(crate) fn new(
        request_id: RequestId,
        progress_token: Option<ProgressToken>,
        cancel: CancellationToken,
        peer: Session,
    ) -> Self {
        Self {
            request_id,
            progress_token,
            cancel,
            peer,
        }
    }

    /// The id of the request being handled.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// The `_meta.progressToken` the caller attached, if any.
    #[must_use]
    pub fn progress_token(&self) -> Option<&ProgressToken> {
        self.progress_token.as_ref()
    }

    /// Check if the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes when the request is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Get the cancellation token for this request.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The session this request arrived on.
    #[must_use]
    pub const fn peer(&self) -> &Session {
        &self.peer
    }

    /// Report progress for this operation.
    ///
    /// Sends `notifications/progress` when the caller supplied a progress
    /// token and does nothing otherwise.
    pub async fn progress(
        &self,
        progress: f64,
        total: Option<f64>,
        message: Option<&str>,
    ) -> Result<(), McpError> {
        let Some(token) = &self.progress_token else {
            return Ok(());
        };

        let params = ProgressNotification {
            progress_token: token.clone(),
            progress,
            total,
            message: message.map(str::to_string),
        };
        self.peer
            .notify(methods::PROGRESS, Some(serde_json::to_value(params)?))
            .await
    }

    /// Ask the peer's model for a completion.
    ///
    /// See [`Session::create_message`].
    pub async fn create_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<CreateMessageResult, McpError> {
        self.peer.create_message(request).await
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("progress_token", &self.progress_token)
            .field("is_cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
