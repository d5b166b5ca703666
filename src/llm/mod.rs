//! Chat-completion model seam.
//!
//! [`ChatModel`] is the only thing the chat loop knows about the LLM. The
//! production implementation is [`openai::OpenAiModel`]; tests swap in a
//! scripted model.

pub mod openai;

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::agent::ToolDefinition;

pub use openai::OpenAiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, deserialize_with = "content_text")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Accepts either a plain string or an array of `{type: "text", text}` parts.
fn content_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => s,
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    })
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// One increment of a streamed completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamChunk {
    pub delta_text: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl StreamChunk {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            delta_text: Some(s.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

pub type ChunkStream = BoxStream<'static, Result<StreamChunk, LlmError>>;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Starts one completion and returns its chunks as they arrive.
    async fn stream(&self, request: ChatRequest) -> Result<ChunkStream, LlmError>;
}

/// Reassembles tool calls from streamed fragments, keyed by their index.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, ToolCall>,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, delta: &ToolCallDelta) {
        let entry = self.calls.entry(delta.index).or_insert_with(|| ToolCall {
            id: String::new(),
            name: String::new(),
            arguments: String::new(),
        });
        if let Some(id) = &delta.id {
            entry.id = id.clone();
        }
        if let Some(name) = &delta.name {
            entry.name.push_str(name);
        }
        if let Some(args) = &delta.arguments_delta {
            entry.arguments.push_str(args);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Completed calls in index order. Calls the model left without an id get one.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_values()
            .map(|mut call| {
                if call.id.is_empty() {
                    call.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                }
                call
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_fragments_by_index() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&ToolCallDelta {
            index: 1,
            id: Some("call_b".into()),
            name: Some("get_balance".into()),
            arguments_delta: Some("{".into()),
        });
        acc.push(&ToolCallDelta {
            index: 0,
            id: Some("call_a".into()),
            name: Some("getTokenDetails".into()),
            arguments_delta: Some("{\"contractAddress\":".into()),
        });
        acc.push(&ToolCallDelta {
            index: 0,
            arguments_delta: Some("\"0xabc\"}".into()),
            ..Default::default()
        });
        acc.push(&ToolCallDelta {
            index: 1,
            arguments_delta: Some("}".into()),
            ..Default::default()
        });

        let calls = acc.finish();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "getTokenDetails");
        assert_eq!(calls[0].arguments, "{\"contractAddress\":\"0xabc\"}");
        assert_eq!(calls[1].id, "call_b");
        assert_eq!(calls[1].arguments, "{}");
    }

    #[test]
    fn message_content_accepts_parts() {
        let m: ChatMessage = serde_json::from_str(
            r#"{"role":"user","content":[{"type":"text","text":"hello "},{"type":"text","text":"there"}]}"#,
        )
        .unwrap();
        assert_eq!(m.content, "hello there");
        let m: ChatMessage = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(m.content, "");
    }
}
