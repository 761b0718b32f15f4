//! The table of outbound calls awaiting a response.
//!
//! Every outcome (response, cancellation, timeout, closure) has to remove the
//! entry to resolve the call, so whichever gets there first wins and the call
//! resolves exactly once.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::channel::oneshot;
use mcpwire_core::error::McpError;
use mcpwire_core::protocol::RequestId;
use serde_json::Value;

/// What a pending call resolves to.
pub type CallOutcome = Result<Value, McpError>;

struct PendingCall {
    method: String,
    issued_at: Instant,
    tx: oneshot::Sender<CallOutcome>,
}

#[derive(Default)]
struct Table {
    calls: HashMap<RequestId, PendingCall>,
    // Set once by `close_all`; later inserts fail with this reason.
    closed: Option<String>,
}

/// Outstanding outbound calls, keyed by request id.
#[derive(Default)]
pub struct PendingCalls {
    table: Mutex<Table>,
}

impl PendingCalls {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a call and hand back the receiving end of its outcome.
    ///
    /// Fails with `ConnectionClosed` once the table has been closed.
    pub fn insert(
        &self,
        id: RequestId,
        method: &str,
    ) -> Result<oneshot::Receiver<CallOutcome>, McpError> {
        let mut table = self.lock();
        if let Some(reason) = &table.closed {
            return Err(McpError::connection_closed(reason.clone()));
        }
        if table.calls.contains_key(&id) {
            return Err(McpError::internal(format!("request id {id} is already in flight")));
        }
        let (tx, rx) = oneshot::channel();
        table.calls.insert(
            id,
            PendingCall {
                method: method.to_string(),
                issued_at: Instant::now(),
                tx,
            },
        );
        Ok(rx)
    }

    /// Resolve a call. Returns `false` if no call with this id is pending.
    pub fn resolve(&self, id: &RequestId, outcome: CallOutcome) -> bool {
        let call = self.lock().calls.remove(id);
        match call {
            Some(call) => {
                tracing::trace!(
                    %id,
                    method = %call.method,
                    elapsed = ?call.issued_at.elapsed(),
                    "call resolved"
                );
                // The caller may have stopped waiting; that is fine.
                let _ = call.tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Drop a call without resolving it. Returns `false` if it was already gone.
    pub fn remove(&self, id: &RequestId) -> bool {
        self.lock().calls.remove(id).is_some()
    }

    /// Fail every pending call with `ConnectionClosed` and refuse new ones.
    ///
    /// Returns how many calls were failed.
    pub fn close_all(&self, reason: &str) -> usize {
        let drained: Vec<PendingCall> = {
            let mut table = self.lock();
            if table.closed.is_none() {
                table.closed = Some(reason.to_string());
            }
            table.calls.drain().map(|(_, call)| call).collect()
        };
        let count = drained.len();
        for call in drained {
            tracing::debug!(method = %call.method, "failing pending call on close");
            let _ = call.tx.send(Err(McpError::connection_closed(reason)));
        }
        count
    }

    /// Number of calls in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().calls.len()
    }

    /// Whether no calls are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the table has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }
}

impl std::fmt::Debug for PendingCalls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.lock();
        f.debug_struct("PendingCalls")
            .field("in_flight", &table.calls.len())
            .field("closed", &table.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_delivers_once() -> Result<(), McpError> {
        let pending = PendingCalls::new();
        let rx = pending.insert(RequestId::Number(1), "tools/list")?;

        assert!(pending.resolve(&RequestId::Number(1), Ok(json!({"tools": []}))));
        assert!(!pending.resolve(&RequestId::Number(1), Ok(json!(null))));
        assert!(pending.is_empty());

        let outcome = rx.await.map_err(|_| McpError::internal("sender dropped"))?;
        assert_eq!(outcome?, json!({"tools": []}));
        Ok(())
    }

    #[tokio::test]
    async fn test_close_all_fails_every_call() -> Result<(), McpError> {
        let pending = PendingCalls::new();
        let first = pending.insert(RequestId::Number(1), "ping")?;
        let second = pending.insert(RequestId::Number(2), "ping")?;

        assert_eq!(pending.close_all("peer went away"), 2);

        for rx in [first, second] {
            let outcome = rx.await.map_err(|_| McpError::internal("sender dropped"))?;
            assert!(outcome.unwrap_err().is_connection_closed());
        }
        Ok(())
    }

    #[test]
    fn test_insert_after_close_fails() {
        let pending = PendingCalls::new();
        pending.close_all("done");
        assert!(pending.is_closed());

        let err = pending.insert(RequestId::Number(7), "ping").unwrap_err();
        assert!(err.is_connection_closed());
        assert_eq!(err.to_string(), "Connection closed: done");
    }

    #[test]
    fn test_remove_wins_over_late_resolve() -> Result<(), McpError> {
        let pending = PendingCalls::new();
        let rx = pending.insert(RequestId::Number(3), "ping")?;

        assert!(pending.remove(&RequestId::Number(3)));
        assert!(!pending.resolve(&RequestId::Number(3), Ok(json!({}))));
        // The removed call's receiver sees its sender dropped.
        tokio_test::assert_err!(tokio_test::block_on(rx));
        Ok(())
    }

    #[test]
    fn test_duplicate_id_is_rejected() -> Result<(), McpError> {
        let pending = PendingCalls::new();
        let _rx = pending.insert(RequestId::string("a"), "ping")?;
        assert!(pending.insert(RequestId::string("a"), "ping").is_err());
        assert_eq!(pending.len(), 1);
        Ok(())
    }
}
