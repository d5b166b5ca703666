// src/chat/events.rs
//
// Line encoding of chat events for the AI SDK data-stream protocol. Each event
// is one `<code>:<json>\n` line.

use serde_json::{json, Value};

use crate::llm::TokenUsage;

pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const DATA_STREAM_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    TextDelta(String),
    ToolCall {
        id: String,
        name: String,
        args: Value,
    },
    ToolResult {
        id: String,
        result: Value,
    },
    Error(String),
    Finish {
        reason: String,
        usage: TokenUsage,
    },
}

impl ChatEvent {
    /// Encodes the event as one protocol line, newline included.
    pub fn encode(&self) -> String {
        let (code, payload) = match self {
            ChatEvent::TextDelta(text) => ('0', json!(text)),
            ChatEvent::ToolCall { id, name, args } => (
                '9',
                json!({"toolCallId": id, "toolName": name, "args": args}),
            ),
            ChatEvent::ToolResult { id, result } => {
                ('a', json!({"toolCallId": id, "result": result}))
            }
            ChatEvent::Error(message) => ('3', json!(message)),
            ChatEvent::Finish { reason, usage } => {
                ('d', json!({"finishReason": reason, "usage": usage}))
            }
        };
        format!("{}:{}\n", code, payload)
    }
}

/// Maps OpenAI finish reasons to the protocol's spelling.
pub fn normalize_finish_reason(reason: Option<&str>) -> String {
    match reason {
        Some("stop") | None => "stop",
        Some("length") => "length",
        Some("tool_calls") | Some("function_call") => "tool-calls",
        Some("content_filter") => "content-filter",
        Some(_) => "other",
    }
    .to_string()
}
