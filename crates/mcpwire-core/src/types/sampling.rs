//! `sampling/createMessage` payloads.
//!
//! Sampling runs against the usual direction: the server asks the client's
//! model for a completion and the client answers.

use serde::{Deserialize, Serialize};

use super::content::{Content, Role};

/// A message in a sampling conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingMessage {
    /// The role of the message sender.
    pub role: Role,
    /// The message content.
    pub content: Content,
}

impl SamplingMessage {
    /// Create a user message with text content.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::text(text),
        }
    }

    /// Create an assistant message with text content.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::text(text),
        }
    }
}

/// Model selection preferences. Priorities range from 0.0 to 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPreferences {
    /// Hints for model selection, in order of preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<ModelHint>>,
    /// How much to weigh cost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_priority: Option<f64>,
    /// How much to weigh latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_priority: Option<f64>,
    /// How much to weigh capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_priority: Option<f64>,
}

impl ModelPreferences {
    /// Prefer the fastest model.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            speed_priority: Some(1.0),
            ..Default::default()
        }
    }

    /// Prefer the most capable model.
    #[must_use]
    pub fn smart() -> Self {
        Self {
            intelligence_priority: Some(1.0),
            ..Default::default()
        }
    }

    /// Add a model hint.
    #[must_use]
    pub fn hint(mut self, name: impl Into<String>) -> Self {
        self.hints.get_or_insert_with(Vec::new).push(ModelHint {
            name: Some(name.into()),
        });
        self
    }
}

/// A hint for model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHint {
    /// Suggested model name or substring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// What MCP context the client should attach to the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncludeContext {
    /// No additional context.
    #[default]
    None,
    /// Context from the requesting server only.
    ThisServer,
    /// Context from every connected server.
    AllServers,
}

/// Parameters of a `sampling/createMessage` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    /// The conversation so far.
    pub messages: Vec<SamplingMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Model preferences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_preferences: Option<ModelPreferences>,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Context inclusion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_context: Option<IncludeContext>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Provider-specific metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl CreateMessageRequest {
    /// Create a new sampling request.
    #[must_use]
    pub fn new(messages: Vec<SamplingMessage>, max_tokens: u32) -> Self {
        Self {
            messages,
            max_tokens,
            model_preferences: None,
            system_prompt: None,
            include_context: None,
            temperature: None,
            stop_sequences: None,
            metadata: None,
        }
    }

    /// Create a request with a single user message.
    #[must_use]
    pub fn simple(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self::new(vec![SamplingMessage::user(prompt)], max_tokens)
    }

    /// Set model preferences.
    #[must_use]
    pub fn model_preferences(mut self, prefs: ModelPreferences) -> Self {
        self.model_preferences = Some(prefs);
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set context inclusion.
    #[must_use]
    pub fn include_context(mut self, context: IncludeContext) -> Self {
        self.include_context = Some(context);
        self
    }

    /// Set the temperature, clamped to `0.0..=2.0`.
    #[must_use]
    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    /// Add a stop sequence.
    #[must_use]
    pub fn stop_sequence(mut self, seq: impl Into<String>) -> Self {
        self.stop_sequences
            .get_or_insert_with(Vec::new)
            .push(seq.into());
        self
    }
}

/// Result of a sampling request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageResult {
    /// Role of the generated message (normally assistant).
    pub role: Role,
    /// The generated content.
    pub content: Content,
    /// The model that produced it.
    pub model: String,
    /// Why generation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
}

impl CreateMessageResult {
    /// An assistant text reply.
    #[must_use]
    pub fn text(model: impl Into<String>, text: impl Into<String>, stop_reason: StopReason) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::text(text),
            model: model.into(),
            stop_reason: Some(stop_reason),
        }
    }

    /// Get the text content if this is a text response.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.content.as_text()
    }
}

/// Why sampling stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// The model finished its turn.
    EndTurn,
    /// Hit the token limit.
    MaxTokens,
    /// Hit a stop sequence.
    StopSequence,
    /// Anything else the client reports.
    Other,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::EndTurn => "endTurn",
            Self::MaxTokens => "maxTokens",
            Self::StopSequence => "stopSequence",
            Self::Other => "other",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = CreateMessageRequest::simple("What is the capital of France?", 100)
            .system_prompt("Answer briefly")
            .temperature(0.5)
            .include_context(IncludeContext::ThisServer)
            .model_preferences(ModelPreferences::smart().hint("claude"));

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [{"role": "user", "content": {"type": "text", "text": "What is the capital of France?"}}],
                "maxTokens": 100,
                "systemPrompt": "Answer briefly",
                "temperature": 0.5,
                "includeContext": "thisServer",
                "modelPreferences": {"hints": [{"name": "claude"}], "intelligencePriority": 1.0}
            })
        );
    }

    #[test]
    fn test_temperature_clamping() {
        let request = CreateMessageRequest::simple("Test", 100).temperature(3.0);
        assert_eq!(request.temperature, Some(2.0));

        let request = CreateMessageRequest::simple("Test", 100).temperature(-1.0);
        assert_eq!(request.temperature, Some(0.0));
    }

    #[test]
    fn test_stop_reasons_are_camel_case() {
        for (reason, wire) in [
            (StopReason::EndTurn, "endTurn"),
            (StopReason::MaxTokens, "maxTokens"),
            (StopReason::StopSequence, "stopSequence"),
            (StopReason::Other, "other"),
        ] {
            assert_eq!(serde_json::to_value(reason).unwrap(), json!(wire));
            assert_eq!(reason.to_string(), wire);
        }
        assert!(serde_json::from_value::<StopReason>(json!("end_turn")).is_err());
    }

    #[test]
    fn test_result_decoding() {
        let result: CreateMessageResult = serde_json::from_value(json!({
            "role": "assistant",
            "content": {"type": "text", "text": "Paris"},
            "model": "test-model",
            "stopReason": "endTurn"
        }))
        .unwrap();
        assert_eq!(result, CreateMessageResult::text("test-model", "Paris", StopReason::EndTurn));
    }
}
