//! Streamed, multi-step agent conversation.
//!
//! A chat request runs in one spawned task that drives the model, executes the
//! tool calls it asks for, and feeds [`ChatEvent`]s into a bounded channel. The
//! HTTP body is the receiving end, so the stream is lazy, finite and has a
//! single consumer. It always ends with exactly one `Finish` or `Error` event.

pub mod events;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::agent::Toolset;
use crate::llm::{ChatMessage, ChatModel, ChatRequest, TokenUsage, ToolCallAccumulator};

pub use events::{normalize_finish_reason, ChatEvent, DATA_STREAM_HEADER, DATA_STREAM_VERSION};
pub use prompt::build_system_prompt;

const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct ChatLimits {
    /// Model turns per request; tool results trigger another turn until this is hit
    pub max_steps: usize,
    pub max_duration: Duration,
}

impl Default for ChatLimits {
    fn default() -> Self {
        Self {
            max_steps: 5,
            max_duration: Duration::from_secs(30),
        }
    }
}

/// Receiver went away; stop producing
struct Disconnected;

struct Emitter {
    tx: mpsc::Sender<ChatEvent>,
}

impl Emitter {
    async fn send(&self, event: ChatEvent) -> Result<(), Disconnected> {
        debug!(event = ?event, "chat event");
        self.tx.send(event).await.map_err(|_| Disconnected)
    }
}

/// Starts the agent loop and returns its event stream.
pub fn spawn_chat(
    model: Arc<dyn ChatModel>,
    toolset: Toolset,
    system: String,
    messages: Vec<ChatMessage>,
    limits: ChatLimits,
) -> ReceiverStream<ChatEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let request_id = uuid::Uuid::new_v4();

    tokio::spawn(async move {
        let emitter = Emitter { tx };
        info!(%request_id, chain = toolset.chain().name, "Chat started");

        let run = run_agent(model.as_ref(), &toolset, system, messages, limits.max_steps, &emitter);
        match tokio::time::timeout(limits.max_duration, run).await {
            Ok(Ok(())) => info!(%request_id, "Chat finished"),
            Ok(Err(Disconnected)) => warn!(%request_id, "Client disconnected, chat aborted"),
            Err(_) => {
                warn!(%request_id, "Chat exceeded {:?}", limits.max_duration);
                let _ = emitter
                    .send(ChatEvent::Error(format!(
                        "Request exceeded maximum duration of {}s",
                        limits.max_duration.as_secs()
                    )))
                    .await;
            }
        }
    });

    ReceiverStream::new(rx)
}

/// The agent loop. Model or tool-dispatch errors are reported as an `Error` event.
async fn run_agent(
    model: &dyn ChatModel,
    toolset: &Toolset,
    system: String,
    mut messages: Vec<ChatMessage>,
    max_steps: usize,
    emitter: &Emitter,
) -> Result<(), Disconnected> {
    let tools = toolset.definitions();
    let mut usage = TokenUsage::default();
    let max_steps = max_steps.max(1);

    for step in 1..=max_steps {
        let request = ChatRequest {
            system: system.clone(),
            messages: messages.clone(),
            tools: tools.clone(),
        };

        let mut chunks = match model.stream(request).await {
            Ok(stream) => stream,
            Err(e) => return emitter.send(ChatEvent::Error(e.to_string())).await,
        };

        let mut text = String::new();
        let mut calls = ToolCallAccumulator::default();
        let mut finish_reason = None;

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return emitter.send(ChatEvent::Error(e.to_string())).await,
            };
            if let Some(delta) = chunk.delta_text {
                text.push_str(&delta);
                emitter.send(ChatEvent::TextDelta(delta)).await?;
            }
            for delta in &chunk.tool_calls {
                calls.push(delta);
            }
            if let Some(reason) = chunk.finish_reason {
                finish_reason = Some(reason);
            }
            if let Some(u) = chunk.usage {
                usage.add(u);
            }
        }

        if calls.is_empty() {
            return emitter
                .send(ChatEvent::Finish {
                    reason: normalize_finish_reason(finish_reason.as_deref()),
                    usage,
                })
                .await;
        }

        let calls = calls.finish();
        debug!(step, tool_calls = calls.len(), "Model requested tools");
        messages.push(ChatMessage::assistant(text, calls.clone()));

        for call in calls {
            let args: Value = if call.arguments.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                match serde_json::from_str(&call.arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        return emitter
                            .send(ChatEvent::Error(format!(
                                "Invalid arguments for tool {}: {}",
                                call.name, e
                            )))
                            .await
                    }
                }
            };

            emitter
                .send(ChatEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    args: args.clone(),
                })
                .await?;

            let outcome = toolset.execute(&call.name, args).await;
            let result = outcome.to_value();
            info!(tool = %call.name, success = outcome.success, "Tool executed");

            emitter
                .send(ChatEvent::ToolResult {
                    id: call.id.clone(),
                    result: result.clone(),
                })
                .await?;
            messages.push(ChatMessage::tool_result(call.id, result.to_string()));
        }
    }

    emitter
        .send(ChatEvent::Finish {
            reason: "tool-calls".to_string(),
            usage,
        })
        .await
}
