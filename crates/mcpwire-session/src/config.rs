//! Session tuning knobs.

use std::time::Duration;

/// Default bound on concurrently running inbound handlers.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Default capacity of the outbound message queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline applied to every outbound request that does not set its own.
    ///
    /// `None` waits until the response arrives or the session closes.
    pub request_timeout: Option<Duration>,
    /// How many inbound requests may run their handlers at once.
    pub max_concurrent_requests: usize,
    /// Capacity of the queue in front of the single writer.
    pub outbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Bound the number of concurrently running inbound handlers.
    ///
    /// Zero is treated as one.
    #[must_use]
    pub const fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Set the outbound queue capacity. Zero is treated as one.
    #[must_use]
    pub const fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }
}
