//! Content payloads for tool results, prompt messages and sampling.
//!
//! [`Content`] is a tagged union on the `type` member. Decoding an unknown
//! tag fails with [`ContentDecodeError::UnknownType`] naming the tag, rather
//! than falling back to some default variant.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::resource::ResourceContents;

/// Discriminants understood by [`Content`].
pub const CONTENT_TYPES: [&str; 4] = ["text", "image", "audio", "resource"];

/// Content that can be included in messages and results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text content.
    Text(TextContent),
    /// Image content (base64 encoded).
    Image(ImageContent),
    /// Audio content (base64 encoded).
    Audio(AudioContent),
    /// An embedded resource.
    Resource(EmbeddedResource),
}

/// Why a content value could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentDecodeError {
    /// The value has no string `type` member.
    #[error("content is missing its `type` discriminant")]
    MissingType,
    /// The `type` member names a variant this library does not know.
    #[error("unsupported content type `{discriminant}` (expected one of: text, image, audio, resource)")]
    UnknownType {
        /// The unrecognized discriminant.
        discriminant: String,
    },
    /// The discriminant is known but the body does not match it.
    #[error("invalid `{discriminant}` content: {message}")]
    Invalid {
        /// The discriminant that was being decoded.
        discriminant: &'static str,
        /// The underlying problem.
        message: String,
    },
}

impl Content {
    /// Decode content from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, ContentDecodeError> {
        let discriminant = match value.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            _ => return Err(ContentDecodeError::MissingType),
        };
        let Some(known) = CONTENT_TYPES.iter().copied().find(|t| *t == discriminant) else {
            return Err(ContentDecodeError::UnknownType { discriminant });
        };
        let decoded = match known {
            "text" => serde_json::from_value(value).map(Self::Text),
            "image" => serde_json::from_value(value).map(Self::Image),
            "audio" => serde_json::from_value(value).map(Self::Audio),
            _ => serde_json::from_value(value).map(Self::Resource),
        };
        decoded.map_err(|e| ContentDecodeError::Invalid {
            discriminant: known,
            message: e.to_string(),
        })
    }

    /// Create text content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextContent {
            text: text.into(),
            annotations: None,
        })
    }

    /// Create image content from base64 data.
    #[must_use]
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Image(ImageContent {
            data: data.into(),
            mime_type: mime_type.into(),
            annotations: None,
        })
    }

    /// Create audio content from base64 data.
    #[must_use]
    pub fn audio(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Audio(AudioContent {
            data: data.into(),
            mime_type: mime_type.into(),
            annotations: None,
        })
    }

    /// Embed resource contents.
    #[must_use]
    pub fn resource(contents: ResourceContents) -> Self {
        Self::Resource(EmbeddedResource {
            resource: contents,
            annotations: None,
        })
    }

    /// Get the text if this is text content.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    /// The discriminant this content serializes with.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Audio(_) => "audio",
            Self::Resource(_) => "resource",
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// Text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// The text content.
    pub text: String,
    /// Optional annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ContentAnnotations>,
}

/// Image content (base64 encoded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Base64-encoded image data.
    pub data: String,
    /// MIME type (e.g., "image/png").
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Optional annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ContentAnnotations>,
}

/// Audio content (base64 encoded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioContent {
    /// Base64-encoded audio data.
    pub data: String,
    /// MIME type (e.g., "audio/wav").
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Optional annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ContentAnnotations>,
}

/// A resource embedded in a message or result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedResource {
    /// The resource contents.
    pub resource: ResourceContents,
    /// Optional annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ContentAnnotations>,
}

/// Annotations that can be attached to content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAnnotations {
    /// Who the content is for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<Role>>,
    /// Priority level (0.0 to 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The model.
    Assistant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_text_wire_shape() {
        let value = serde_json::to_value(Content::text("hello")).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn test_decode_by_discriminant() {
        let image: Content =
            serde_json::from_value(json!({"type": "image", "data": "aGk=", "mimeType": "image/png"}))
                .unwrap();
        assert_eq!(image, Content::image("aGk=", "image/png"));

        let embedded: Content = serde_json::from_value(json!({
            "type": "resource",
            "resource": {"uri": "file:///a.txt", "text": "A"}
        }))
        .unwrap();
        assert_eq!(embedded.kind(), "resource");
    }

    #[test]
    fn test_unknown_discriminant_is_named() {
        let err = Content::from_value(json!({"type": "video", "url": "x"})).unwrap_err();
        assert_eq!(
            err,
            ContentDecodeError::UnknownType {
                discriminant: "video".to_string()
            }
        );
        assert!(err.to_string().contains("`video`"));

        let serde_err = serde_json::from_value::<Content>(json!({"type": "video"})).unwrap_err();
        assert!(serde_err.to_string().contains("unsupported content type `video`"));
    }

    #[test]
    fn test_missing_or_malformed_body() {
        assert_eq!(
            Content::from_value(json!({"text": "no tag"})).unwrap_err(),
            ContentDecodeError::MissingType
        );
        assert!(matches!(
            Content::from_value(json!({"type": "text"})).unwrap_err(),
            ContentDecodeError::Invalid { discriminant: "text", .. }
        ));
    }
}
