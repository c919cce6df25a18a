use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};

/// One message on the chat-completion wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: WireRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: WireRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: WireRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Assistant,
}

/// Raw chat-completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: WireFunction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireFunction {
    pub name: String,
    /// JSON-encoded argument object, exactly as the endpoint sent it.
    pub arguments: String,
}

/// What the model asked for in one response choice, decided in a single
/// parsing step so downstream logic switches on the variant instead of
/// probing for field presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
}

/// A single tool invocation requested by the model. Arguments stay raw
/// until the orchestrator validates them against the known tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub name: String,
    pub raw_arguments: String,
}

impl Choice {
    /// Classify this choice. A choice carrying neither usable text nor tool
    /// calls is malformed and aborts the turn.
    pub fn into_reply(self) -> Result<ModelReply> {
        if let Some(calls) = self.message.tool_calls {
            if !calls.is_empty() {
                return Ok(ModelReply::ToolCalls(
                    calls
                        .into_iter()
                        .map(|c| ToolCallRequest {
                            name: c.function.name,
                            raw_arguments: c.function.arguments,
                        })
                        .collect(),
                ));
            }
        }

        match self.message.content {
            Some(text) => Ok(ModelReply::Text(text)),
            None => Err(AgentError::response_format(
                "choice has neither content nor tool_calls",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_from(json: serde_json::Value) -> Choice {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_plain_text_choice() {
        let choice = choice_from(serde_json::json!({
            "message": {"content": "hello there"}
        }));

        assert_eq!(
            choice.into_reply().unwrap(),
            ModelReply::Text("hello there".to_string())
        );
    }

    #[test]
    fn test_tool_call_choice() {
        let choice = choice_from(serde_json::json!({
            "message": {
                "tool_calls": [
                    {"id": "call_1", "function": {"name": "calculate_sum", "arguments": "{\"a\":2,\"b\":3}"}}
                ]
            }
        }));

        let reply = choice.into_reply().unwrap();
        match reply {
            ModelReply::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "calculate_sum");
                assert_eq!(calls[0].raw_arguments, "{\"a\":2,\"b\":3}");
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_calls_win_over_content() {
        // Some endpoints send empty content alongside tool_calls.
        let choice = choice_from(serde_json::json!({
            "message": {
                "content": "",
                "tool_calls": [
                    {"function": {"name": "create_database", "arguments": "{\"name\":\"notes\"}"}}
                ]
            }
        }));

        assert!(matches!(
            choice.into_reply().unwrap(),
            ModelReply::ToolCalls(_)
        ));
    }

    #[test]
    fn test_empty_tool_calls_falls_back_to_content() {
        let choice = choice_from(serde_json::json!({
            "message": {"content": "no tools needed", "tool_calls": []}
        }));

        assert_eq!(
            choice.into_reply().unwrap(),
            ModelReply::Text("no tools needed".to_string())
        );
    }

    #[test]
    fn test_malformed_choice_is_rejected() {
        let choice = choice_from(serde_json::json!({"message": {}}));

        let err = choice.into_reply().unwrap_err();
        assert!(matches!(err, AgentError::ResponseFormat(_)));
    }

    #[test]
    fn test_wire_role_serialization() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");

        let msg = ChatMessage::assistant("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
