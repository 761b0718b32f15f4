//! Frame encoding and decoding with failure attribution.
//!
//! Transports that carry bytes (stdio, HTTP) run every frame through
//! [`decode`]. When a frame is malformed the resulting [`DecodeError`] still
//! records whatever could be recovered from it (the frame kind and the `id`),
//! so the session can fail one pending call or answer one bad request instead
//! of tearing down the connection. The in-process transport skips this stage
//! entirely.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::McpError;
use crate::protocol::{Message, RequestId};

/// What a frame claims to be, judged by its members alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Has `method` and `id`.
    Request,
    /// Has `id` (or `result` / `error`) but no `method`.
    Response,
    /// Has `method` but no `id`.
    Notification,
    /// Not an object, or none of the above.
    Unknown,
}

impl FrameKind {
    /// Classify a parsed JSON value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Unknown;
        };
        let has_id = object.contains_key("id");
        if object.contains_key("method") {
            if has_id { Self::Request } else { Self::Notification }
        } else if has_id || object.contains_key("result") || object.contains_key("error") {
            Self::Response
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Notification => "notification",
            Self::Unknown => "unrecognized",
        })
    }
}

/// A frame that could not be decoded into a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// The frame's `id`, when it could be read.
    pub id: Option<RequestId>,
    /// What the frame looked like.
    pub kind: FrameKind,
    /// What was wrong with it.
    pub message: String,
}

impl DecodeError {
    /// A failure with nothing to attribute it to.
    pub fn unattributed(message: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: FrameKind::Unknown,
            message: message.into(),
        }
    }

    /// Whether the failure belongs to one request or response.
    ///
    /// Unattributable failures are connection-level protocol errors.
    #[must_use]
    pub fn is_attributable(&self) -> bool {
        self.id.is_some() && matches!(self.kind, FrameKind::Request | FrameKind::Response)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} frame", self.kind)?;
        if let Some(id) = &self.id {
            write!(f, " (id {id})")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for McpError {
    fn from(err: DecodeError) -> Self {
        Self::parse_with_source(err.to_string(), err)
    }
}

/// Decode one frame of text.
pub fn decode(text: &str) -> Result<Message, DecodeError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| DecodeError::unattributed(format!("malformed JSON: {e}")))?;
    decode_value(value)
}

/// Decode an already parsed JSON value.
pub fn decode_value(value: Value) -> Result<Message, DecodeError> {
    let kind = FrameKind::of(&value);
    let id = value
        .get("id")
        .and_then(|id| RequestId::deserialize(id).ok());
    Message::from_value(value).map_err(|e| DecodeError {
        id,
        kind,
        message: e.to_string(),
    })
}

/// Encode a message as a single line of JSON (no trailing newline).
pub fn encode(message: &Message) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
