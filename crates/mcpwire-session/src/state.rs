//! Connection lifecycle states.

use std::fmt;

/// Where a session is in its lifecycle.
///
/// States only move forward:
/// `Uninitialized → Initializing → Ready → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// Transport attached, no handshake yet.
    Uninitialized,
    /// `initialize` is in flight.
    Initializing,
    /// Handshake done; traffic flows both ways.
    Ready,
    /// Teardown started; new requests fail.
    Closing,
    /// Everything released.
    Closed,
}

impl SessionState {
    /// Whether the session accepts new outbound requests.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
        })
    }
}

/// Which end of the handshake this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sends `initialize`.
    Client,
    /// Answers `initialize`.
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::Server => "server",
        })
    }
}
