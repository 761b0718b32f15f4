//! JSON-RPC 2.0 envelopes.
//!
//! Every MCP message is a request, a response, or a notification. The types
//! here enforce the envelope rules while deserializing, so a value that
//! exists is a valid envelope:
//!
//! - `jsonrpc` must be exactly `"2.0"`
//! - a request carries `id` and `method`, a notification `method` only
//! - a response carries `id` and exactly one of `result` / `error`
//!
//! ```rust
//! use mcpwire_core::protocol::{Message, Request, RequestId};
//!
//! let request = Request::new("tools/list", RequestId::Number(1));
//! assert_eq!(request.method(), "tools/list");
//!
//! let both = r#"{"jsonrpc":"2.0","id":1,"result":{},"error":{"code":1,"message":"x"}}"#;
//! assert!(serde_json::from_str::<Message>(both).is_err());
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::codec::FrameKind;
use crate::error::JsonRpcError;

/// The JSON-RPC version string. Always "2.0".
pub const JSONRPC_VERSION: &str = "2.0";

/// The `jsonrpc` member of an envelope.
///
/// Serializes as `"2.0"` and refuses anything else when deserializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = Cow::<'de, str>::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(Self)
        } else {
            Err(de::Error::invalid_value(
                Unexpected::Str(&version),
                &"jsonrpc version \"2.0\"",
            ))
        }
    }
}

/// A JSON-RPC request ID.
///
/// Ids are opaque tokens: integers or strings. The session assigns
/// non-negative integers; peers may use any signed integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl RequestId {
    /// Create a new numeric request ID.
    #[must_use]
    pub const fn number(id: i64) -> Self {
        Self::Number(id)
    }

    /// Create a new string request ID.
    #[must_use]
    pub fn string(id: impl Into<String>) -> Self {
        Self::String(id.into())
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<u64> for RequestId {
    /// Values beyond `i64::MAX` have no integer form on the wire and keep
    /// their digits as a string id.
    fn from(id: u64) -> Self {
        i64::try_from(id).map_or_else(|_| Self::String(id.to_string()), Self::Number)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The JSON-RPC version.
    pub jsonrpc: JsonRpcVersion,
    /// The request ID for correlation.
    pub id: RequestId,
    /// The method to invoke.
    pub method: Cow<'static, str>,
    /// The method parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Create a new request with no parameters.
    #[must_use]
    pub fn new(method: impl Into<Cow<'static, str>>, id: impl Into<RequestId>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    /// Create a new request with parameters.
    #[must_use]
    pub fn with_params(
        method: impl Into<Cow<'static, str>>,
        id: impl Into<RequestId>,
        params: Value,
    ) -> Self {
        Self {
            params: Some(params),
            ..Self::new(method, id)
        }
    }

    /// Get the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The `_meta.progressToken` the caller attached, if any.
    #[must_use]
    pub fn progress_token(&self) -> Option<ProgressToken> {
        let token = self.params.as_ref()?.get("_meta")?.get("progressToken")?;
        ProgressToken::deserialize(token).ok()
    }
}

/// The outcome carried by a response: a result or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    /// Successful result.
    Result(Value),
    /// Error object.
    Error(JsonRpcError),
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResponse")]
pub struct Response {
    /// The JSON-RPC version.
    pub jsonrpc: JsonRpcVersion,
    /// The request ID this response corresponds to.
    pub id: RequestId,
    /// Result or error.
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl Response {
    /// Create a successful response.
    #[must_use]
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            payload: ResponsePayload::Result(result),
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(id: impl Into<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            payload: ResponsePayload::Error(error),
        }
    }

    /// Check if this response indicates success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.payload, ResponsePayload::Result(_))
    }

    /// Check if this response indicates an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    /// Get the result, consuming self.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.payload {
            ResponsePayload::Result(value) => Ok(value),
            ResponsePayload::Error(error) => Err(error),
        }
    }
}

/// Wire shape of a response before the result/error check.
#[derive(Deserialize)]
struct RawResponse {
    jsonrpc: JsonRpcVersion,
    id: RequestId,
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// `"result": null` is a present result, unlike a missing member.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawResponse> for Response {
    type Error = &'static str;

    fn try_from(raw: RawResponse) -> Result<Self, Self::Error> {
        let payload = match (raw.result, raw.error) {
            (Some(result), None) => ResponsePayload::Result(result),
            (None, Some(error)) => ResponsePayload::Error(error),
            (Some(_), Some(_)) => return Err("response carries both `result` and `error`"),
            (None, None) => return Err("response carries neither `result` nor `error`"),
        };
        Ok(Self {
            jsonrpc: raw.jsonrpc,
            id: raw.id,
            payload,
        })
    }
}

/// A JSON-RPC 2.0 notification. No id, no response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// The JSON-RPC version.
    pub jsonrpc: JsonRpcVersion,
    /// The notification method.
    pub method: Cow<'static, str>,
    /// The notification parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Create a new notification with no parameters.
    #[must_use]
    pub fn new(method: impl Into<Cow<'static, str>>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params: None,
        }
    }

    /// Create a new notification with parameters.
    #[must_use]
    pub fn with_params(method: impl Into<Cow<'static, str>>, params: Value) -> Self {
        Self {
            params: Some(params),
            ..Self::new(method)
        }
    }

    /// Get the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Any JSON-RPC 2.0 message.
///
/// Deserialization classifies the frame first (a `method` member makes it a
/// request or notification, otherwise it is a response) and then applies the
/// rules of that kind, so errors name the actual problem instead of "did not
/// match any variant".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A request message.
    Request(Request),
    /// A response message.
    Response(Response),
    /// A notification message.
    Notification(Notification),
}

impl Message {
    /// Build a message from an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match FrameKind::of(&value) {
            FrameKind::Request => serde_json::from_value(value).map(Self::Request),
            FrameKind::Notification => serde_json::from_value(value).map(Self::Notification),
            FrameKind::Response => serde_json::from_value(value).map(Self::Response),
            FrameKind::Unknown => Err(de::Error::custom(
                "not a JSON-RPC message: expected an object with `method` or `id`",
            )),
        }
    }

    /// Get the method name if this is a request or notification.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }

    /// Get the request ID if this is a request or response.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(r) => Some(&r.id),
            Self::Response(r) => Some(&r.id),
            Self::Notification(_) => None,
        }
    }

    /// The frame kind of this message.
    #[must_use]
    pub const fn kind(&self) -> FrameKind {
        match self {
            Self::Request(_) => FrameKind::Request,
            Self::Response(_) => FrameKind::Response,
            Self::Notification(_) => FrameKind::Notification,
        }
    }

    /// Check if this is a request.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Check if this is a response.
    #[must_use]
    pub const fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    /// Check if this is a notification.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        matches!(self, Self::Notification(_))
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Self::Request(r)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Self::Response(r)
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Self::Notification(n)
    }
}

/// A progress token for tracking long-running operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressToken {
    /// Numeric progress token.
    Number(i64),
    /// String progress token.
    String(String),
}

impl fmt::Display for ProgressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// An opaque pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = Request::with_params("tools/call", 1u64, json!({"name": "search"}));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {"name": "search"}})
        );
    }

    #[test]
    fn test_request_id_conversions() {
        assert_eq!(RequestId::from(7u64), RequestId::Number(7));
        assert_eq!(RequestId::from(-3i64), RequestId::Number(-3));
        assert_eq!(
            RequestId::from(u64::MAX),
            RequestId::string(u64::MAX.to_string())
        );
    }

    #[test]
    fn test_notification_has_no_id() {
        let notification = Notification::new("notifications/initialized");
        let json = serde_json::to_string(&notification).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
    }

    #[test]
    fn test_response_serializes_single_member() {
        let ok = serde_json::to_value(Response::success(1u64, json!({"tools": []}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}}));

        let err = serde_json::to_value(Response::error(
            "abc",
            JsonRpcError::method_not_found("Method not found: foo"),
        ))
        .unwrap();
        assert_eq!(
            err,
            json!({"jsonrpc": "2.0", "id": "abc", "error": {"code": -32601, "message": "Method not found: foo"}})
        );
    }

    #[test]
    fn test_response_with_both_members_is_rejected() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{},"error":{"code":-32603,"message":"x"}}"#;
        let err = serde_json::from_str::<Response>(json).unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_response_with_neither_member_is_rejected() {
        let err = serde_json::from_str::<Message>(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }

    #[test]
    fn test_null_result_counts_as_present() {
        let msg: Message = serde_json::from_str(r#"{"jsonrpc":"2.0","id":4,"result":null}"#).unwrap();
        assert_eq!(msg, Message::Response(Response::success(4u64, Value::Null)));
    }

    #[test]
    fn test_wrong_jsonrpc_version_is_rejected() {
        for json in [
            r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
            r#"{"id":1,"method":"ping"}"#,
            r#"{"jsonrpc":2.0,"method":"ping"}"#,
        ] {
            assert!(serde_json::from_str::<Message>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_message_classification() {
        let msg: Message = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"test"}"#).unwrap();
        assert!(msg.is_request());
        assert_eq!(msg.method(), Some("test"));

        let msg: Message = serde_json::from_str(r#"{"jsonrpc":"2.0","id":"x","result":{}}"#).unwrap();
        assert!(msg.is_response());
        assert_eq!(msg.id(), Some(&RequestId::string("x")));

        let msg: Message = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notify"}"#).unwrap();
        assert!(msg.is_notification());
    }

    #[test]
    fn test_envelopes_survive_a_round_trip() {
        let messages = [
            Message::from(Request::with_params("initialize", 0u64, json!({"protocolVersion": "2024-11-05"}))),
            Message::from(Response::error(9u64, JsonRpcError::invalid_params("bad"))),
            Message::from(Notification::with_params(
                "notifications/cancelled",
                json!({"requestId": 3, "reason": "user"}),
            )),
        ];
        for message in messages {
            let text = serde_json::to_string(&message).unwrap();
            let back: Message = serde_json::from_str(&text).unwrap();
            assert_eq!(back, message);
        }
    }

    #[test]
    fn test_progress_token_from_meta() {
        let request = Request::with_params(
            "tools/call",
            2u64,
            json!({"name": "slow", "_meta": {"progressToken": "p-1"}}),
        );
        assert_eq!(
            request.progress_token(),
            Some(ProgressToken::String("p-1".to_string()))
        );
        assert_eq!(Request::new("ping", 3u64).progress_token(), None);
    }
}
