// src/llm/openai.rs
//
// OpenAI-compatible chat completions over SSE. Works against any endpoint that
// speaks the /chat/completions streaming dialect.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::{
    ChatMessage, ChatModel, ChatRequest, ChunkStream, LlmError, Role, StreamChunk, ToolCallDelta,
    TokenUsage,
};
use crate::agent::ToolDefinition;

pub struct OpenAiModel {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: SecretString, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }

    fn format_messages(system: &str, messages: &[ChatMessage]) -> Vec<Value> {
        let mut out = vec![json!({"role": "system", "content": system})];
        out.extend(messages.iter().map(|msg| {
            let mut m = json!({
                "role": msg.role,
                "content": msg.content,
            });
            if !msg.tool_calls.is_empty() {
                m["tool_calls"] = msg
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {"name": tc.name, "arguments": tc.arguments}
                        })
                    })
                    .collect();
                if msg.content.is_empty() {
                    m["content"] = Value::Null;
                }
            }
            if msg.role == Role::Tool {
                if let Some(id) = &msg.tool_call_id {
                    m["tool_call_id"] = json!(id);
                }
            }
            m
        }));
        out
    }

    fn format_tools(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect()
    }
}

/// Parses one SSE `data:` payload. Returns `None` for `[DONE]` and for lines
/// that are not completion chunks.
pub fn parse_sse_chunk(data: &str) -> Option<StreamChunk> {
    if data == "[DONE]" {
        return None;
    }
    let v: Value = serde_json::from_str(data).ok()?;

    let usage = v.get("usage").filter(|u| !u.is_null()).map(|u| TokenUsage {
        prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
        completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
    });

    // The usage-only trailer has an empty choices array
    let Some(choice) = v["choices"].get(0) else {
        return usage.map(|usage| StreamChunk {
            usage: Some(usage),
            ..Default::default()
        });
    };
    let delta = &choice["delta"];

    let tool_calls = delta["tool_calls"]
        .as_array()
        .map(|tcs| {
            tcs.iter()
                .map(|tc| ToolCallDelta {
                    index: tc["index"].as_u64().unwrap_or(0) as usize,
                    id: tc["id"].as_str().map(str::to_string),
                    name: tc["function"]["name"].as_str().map(str::to_string),
                    arguments_delta: tc["function"]["arguments"].as_str().map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(StreamChunk {
        delta_text: delta["content"].as_str().filter(|s| !s.is_empty()).map(str::to_string),
        tool_calls,
        finish_reason: choice["finish_reason"].as_str().map(str::to_string),
        usage,
    })
}

struct SseReader {
    bytes: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    buffer: Vec<u8>,
    pending: VecDeque<StreamChunk>,
    done: bool,
}

impl SseReader {
    /// Moves every complete line out of the buffer; stops at `[DONE]`.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
            if self.done {
                return;
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim_start();
            if data == "[DONE]" {
                self.done = true;
            } else if let Some(chunk) = parse_sse_chunk(data) {
                self.pending.push_back(chunk);
            }
        }
    }

    fn into_stream(self) -> ChunkStream {
        stream::unfold(self, |mut reader| async move {
            loop {
                if let Some(chunk) = reader.pending.pop_front() {
                    return Some((Ok(chunk), reader));
                }
                if reader.done {
                    return None;
                }
                match reader.bytes.next().await {
                    Some(Ok(bytes)) => {
                        reader.buffer.extend_from_slice(&bytes);
                        reader.drain_lines();
                    }
                    Some(Err(e)) => {
                        reader.done = true;
                        return Some((
                            Err(LlmError::Transport(format!("Stream read error: {}", e))),
                            reader,
                        ));
                    }
                    None => {
                        // Trailing line without newline
                        let rest = std::mem::take(&mut reader.buffer);
                        reader.handle_line(&String::from_utf8_lossy(&rest));
                        reader.done = true;
                    }
                }
            }
        })
        .boxed()
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    async fn stream(&self, request: ChatRequest) -> Result<ChunkStream, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut body = json!({
            "model": self.model,
            "messages": Self::format_messages(&request.system, &request.messages),
            "stream": true,
            "stream_options": {"include_usage": true},
        });
        if !request.tools.is_empty() {
            body["tools"] = json!(Self::format_tools(&request.tools));
        }

        info!(url = %url, model = %self.model, messages = request.messages.len(), "LLM request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %text, "LLM request rejected");
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Auth(text),
                code => LlmError::Api {
                    status: code,
                    message: text,
                },
            });
        }

        debug!("LLM stream opened");
        let reader = SseReader {
            bytes: response.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed(),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        };
        Ok(reader.into_stream())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_tool_fragments() {
        let chunk = parse_sse_chunk(
            r#"{"choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.delta_text.as_deref(), Some("Hel"));
        assert!(chunk.tool_calls.is_empty());

        let chunk = parse_sse_chunk(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"get_balance","arguments":""}}]},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.tool_calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(chunk.tool_calls[0].name.as_deref(), Some("get_balance"));

        let chunk = parse_sse_chunk(
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn parses_usage_trailer_and_done() {
        let chunk = parse_sse_chunk(
            r#"{"choices":[],"usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#,
        )
        .unwrap();
        assert_eq!(
            chunk.usage,
            Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 3
            })
        );
        assert!(parse_sse_chunk("[DONE]").is_none());
        assert!(parse_sse_chunk("not json").is_none());
    }

    #[tokio::test]
    async fn reader_handles_split_lines() {
        let parts: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi".to_vec()),
            Ok(b"\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n".to_vec()),
            Ok(b"data: [DONE]\n".to_vec()),
        ];
        let reader = SseReader {
            bytes: stream::iter(parts).boxed(),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        };
        let chunks: Vec<StreamChunk> = reader
            .into_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;
        let text: String = chunks.iter().filter_map(|c| c.delta_text.clone()).collect();
        assert_eq!(text, "Hi there");
    }

    #[test]
    fn system_prompt_leads_the_message_list() {
        let msgs = OpenAiModel::format_messages("be nice", &[ChatMessage::user("gm")]);
        assert_eq!(msgs[0], json!({"role": "system", "content": "be nice"}));
        assert_eq!(msgs[1], json!({"role": "user", "content": "gm"}));
    }
}
