//! Tool definitions and `tools/*` payloads.
//!
//! A tool failure is data: [`CallToolResult`] with `isError: true`. Only
//! protocol problems (unknown tool, malformed request) are JSON-RPC errors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::Content;

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// A tool definition exposed by a server.
///
/// ```rust
/// use mcpwire_core::types::Tool;
///
/// #[derive(schemars::JsonSchema, serde::Deserialize)]
/// struct EchoArgs {
///     text: String,
/// }
///
/// let tool = Tool::new("echo")
///     .description("Echo the input back")
///     .input_type::<EchoArgs>();
/// assert_eq!(tool.input_schema["properties"]["text"]["type"], "string");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique name of the tool.
    pub name: String,
    /// What the tool does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the tool's arguments.
    pub input_schema: Value,
    /// Behavior hints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

impl Tool {
    /// Create a tool that takes an empty argument object.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: empty_object_schema(),
            annotations: None,
        }
    }

    /// Set the tool's description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tool's input schema.
    #[must_use]
    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Derive the input schema from an argument type.
    #[must_use]
    pub fn input_type<T: JsonSchema>(mut self) -> Self {
        self.input_schema =
            serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| empty_object_schema());
        self
    }

    /// Set the tool's annotations.
    #[must_use]
    pub fn annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// Hints about tool behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The tool has no side effects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    /// The tool may destroy data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    /// Repeating a call has no further effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    /// The tool talks to the outside world.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

impl ToolAnnotations {
    /// Annotations for a read-only tool.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            read_only_hint: Some(true),
            ..Default::default()
        }
    }
}

/// The result of calling a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// The content returned by the tool.
    pub content: Vec<Content>,
    /// Set when the tool failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// A successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: None,
        }
    }

    /// A successful result with several content items.
    #[must_use]
    pub const fn content(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: None,
        }
    }

    /// A failed result carrying the error text.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: Some(true),
        }
    }

    /// Check if this result indicates an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// The first text item, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(Content::as_text)
    }
}

/// What a tool handler returns.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Successful output.
    Success(CallToolResult),
    /// A failure the model can read and correct.
    RecoverableError {
        /// The error message.
        message: String,
        /// How to fix the input, if known.
        suggestion: Option<String>,
    },
}

impl ToolOutput {
    /// A text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Success(CallToolResult::text(text))
    }

    /// A JSON result rendered as pretty-printed text.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string_pretty(value)?;
        Ok(Self::text(json))
    }

    /// A recoverable error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::RecoverableError {
            message: message.into(),
            suggestion: None,
        }
    }

    /// A recoverable error with a suggestion.
    #[must_use]
    pub fn error_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::RecoverableError {
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }
}

impl From<ToolOutput> for CallToolResult {
    fn from(output: ToolOutput) -> Self {
        match output {
            ToolOutput::Success(result) => result,
            ToolOutput::RecoverableError {
                message,
                suggestion: None,
            } => Self::error(message),
            ToolOutput::RecoverableError {
                message,
                suggestion: Some(suggestion),
            } => Self::error(format!("{message}\n\nSuggestion: {suggestion}")),
        }
    }
}

/// Result of `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    /// The available tools.
    pub tools: Vec<Tool>,
    /// Cursor for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments to pass to the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(JsonSchema, Deserialize)]
    #[allow(dead_code)]
    struct Forecast {
        city: String,
        days: Option<u8>,
    }

    #[test]
    fn test_schema_from_type() {
        let tool = Tool::new("forecast").input_type::<Forecast>();
        assert_eq!(tool.input_schema["type"], "object");
        assert_eq!(tool.input_schema["required"], json!(["city"]));
    }

    #[test]
    fn test_tool_wire_shape() {
        let tool = Tool::new("echo")
            .description("Echo")
            .annotations(ToolAnnotations::read_only());
        assert_eq!(
            serde_json::to_value(&tool).unwrap(),
            json!({
                "name": "echo",
                "description": "Echo",
                "inputSchema": {"type": "object", "properties": {}},
                "annotations": {"readOnlyHint": true}
            })
        );
    }

    #[test]
    fn test_error_result_is_data() {
        let result: CallToolResult =
            ToolOutput::error_with_suggestion("Invalid query", "Quote phrases").into();
        assert!(result.is_error());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "content": [{"type": "text", "text": "Invalid query\n\nSuggestion: Quote phrases"}],
                "isError": true
            })
        );
    }
}
